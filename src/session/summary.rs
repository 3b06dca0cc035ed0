//! Derived views over a session log.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// One completed iteration, as seen by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationSummary {
    pub number: u32,
    pub mode: String,
    pub cost: f64,
    pub duration_ms: u64,
    pub subtype: String,
    pub commit: String,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
}

/// Aggregate over the whole session.
///
/// `branch` and `commit` are the most recent non-empty values seen in *any*
/// appended record, not only in completed iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session: String,
    pub started_at: Timestamp,
    pub total_cost: f64,
    pub iterations: usize,
    pub branch: String,
    pub commit: String,
}
