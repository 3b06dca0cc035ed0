//! # Supervisor state snapshot.
//!
//! [`SupervisorState`] is what a status reporter sees: attempt bookkeeping,
//! timestamps, and the latest iteration/commit/branch/mode reported by the
//! workload.
//!
//! ## Rules
//! - `finished_at` is `None` while supervision is in progress.
//! - [`SupervisorState::merge`] only copies non-zero fields; it never clears a value.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::session::LogRecord;

/// Persisted snapshot of one supervision run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupervisorState {
    pub pid: u32,
    pub iteration: u32,
    pub consecutive_errors: u32,
    pub last_output_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub last_commit: String,
    pub branch: String,
    pub mode: String,
    pub total_cost: f64,
    /// Meaningful only once `finished_at` is set.
    pub passed: bool,
}

impl SupervisorState {
    /// Fresh state for a run starting now.
    pub fn start(pid: u32) -> Self {
        let now = Timestamp::now();
        Self {
            pid,
            started_at: Some(now),
            last_output_at: Some(now),
            ..Self::default()
        }
    }

    /// `true` between start and finish.
    pub fn running(&self) -> bool {
        self.started_at.is_some() && self.finished_at.is_none()
    }

    /// Marks the run finished.
    pub fn finish(&mut self, passed: bool) {
        self.passed = passed;
        self.finished_at = Some(Timestamp::now());
    }

    /// Copies the non-zero progress fields of `rec` into the state.
    ///
    /// Returns `true` if any field changed.
    pub fn merge(&mut self, rec: &LogRecord) -> bool {
        let before = (self.iteration, self.total_cost);
        let mut changed = false;

        if rec.iteration > 0 {
            self.iteration = rec.iteration;
        }
        if rec.cost > 0.0 {
            self.total_cost = rec.cost;
        }
        changed |= before != (self.iteration, self.total_cost);
        changed |= merge_str(&mut self.last_commit, &rec.commit);
        changed |= merge_str(&mut self.branch, &rec.branch);
        changed |= merge_str(&mut self.mode, &rec.mode);
        changed
    }
}

fn merge_str(dst: &mut String, src: &str) -> bool {
    if src.is_empty() || dst == src {
        return false;
    }
    src.clone_into(dst);
    true
}
