//! # Tracing subscriber for supervisor events.
//!
//! [`LogWriter`] forwards every [`Event`] to `tracing` with structured fields.
//! Problems (failures, hangs, giving up, reverts) are logged at `WARN`, the
//! rest at `INFO`.
//!
//! ## Output (with a fmt subscriber installed)
//! ```text
//! INFO regent: starting attempt 1/4 seq=0 kind="attempt-starting" attempt=1
//! WARN regent: attempt 1 failed: exit status 1 seq=1 kind="attempt-failed" attempt=1
//! INFO regent: retrying in 30s (after attempt 1) seq=2 kind="backoff-scheduled" delay_ms=30000
//! ```

use async_trait::async_trait;

use super::Subscribe;
use crate::events::{Event, EventKind};

/// Logs supervisor events through `tracing`.
pub struct LogWriter;

impl LogWriter {
    fn is_problem(kind: EventKind) -> bool {
        matches!(
            kind,
            EventKind::AttemptFailed
                | EventKind::HangDetected
                | EventKind::GaveUp
                | EventKind::Reverting
        )
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let msg = e.message();
        let kind = e.kind.as_label();
        if Self::is_problem(e.kind) {
            tracing::warn!(
                target: "regent",
                seq = e.seq,
                kind,
                attempt = e.attempt,
                timeout_ms = e.timeout_ms,
                commit = e.commit.as_deref(),
                "{msg}"
            );
        } else {
            tracing::info!(
                target: "regent",
                seq = e.seq,
                kind,
                attempt = e.attempt,
                delay_ms = e.delay_ms,
                commit = e.commit.as_deref(),
                "{msg}"
            );
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
