//! # Relays supervisor events into the session log.
//!
//! [`NoteRecorder`] appends every event's message as a `supervisor_note`
//! record, so the session log shows retries, hangs and reverts alongside the
//! workload's own output. Notes never open or close an iteration.

use std::sync::Arc;

use async_trait::async_trait;

use super::Subscribe;
use crate::events::Event;
use crate::session::{DurableLog, LogRecord};

/// Writes supervisor events to a [`DurableLog`].
pub struct NoteRecorder {
    log: Arc<DurableLog>,
}

impl NoteRecorder {
    pub fn new(log: Arc<DurableLog>) -> Self {
        Self { log }
    }

    fn record(ev: &Event) -> LogRecord {
        let mut rec = LogRecord::note(ev.message()).with_ts(ev.at);
        if let Some(commit) = &ev.commit {
            rec = rec.with_commit(commit.as_ref());
        }
        rec
    }
}

#[async_trait]
impl Subscribe for NoteRecorder {
    async fn on_event(&self, ev: &Event) {
        let rec = Self::record(ev);
        let log = Arc::clone(&self.log);
        match tokio::task::spawn_blocking(move || log.append(&rec)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, seq = ev.seq, "supervisor note not recorded"),
            Err(err) => tracing::warn!(error = %err, "note writer task failed"),
        }
    }

    fn name(&self) -> &'static str {
        "note-recorder"
    }
}
