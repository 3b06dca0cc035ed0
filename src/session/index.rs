//! # Iteration byte-range index.
//!
//! Maps each completed iteration to the byte range of the log file that holds
//! its records, so read-back is one positioned read instead of a scan.
//!
//! ## Rules
//! - `iteration_start` opens a **pending** entry at the record's offset; a newer
//!   start replaces any pending entry that never completed.
//! - `iteration_complete` closes the pending entry: `end = offset + len` of the
//!   complete line. Without a pending entry (or with a different iteration
//!   number) the record is ignored.
//! - Completing an iteration number twice replaces its range; summaries stay in
//!   completion order.

use std::collections::HashMap;

use super::record::{LogRecord, RecordKind};
use super::summary::IterationSummary;

/// Byte range `[start, end)` of one completed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationRange {
    pub start: u64,
    pub end: u64,
}

impl IterationRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct Pending {
    start: u64,
    summary: IterationSummary,
}

#[derive(Debug, Default)]
pub(crate) struct IterationIndex {
    pending: Option<Pending>,
    ranges: HashMap<u32, IterationRange>,
    summaries: Vec<IterationSummary>,
    last_branch: String,
    last_commit: String,
}

impl IterationIndex {
    /// Feeds one appended record located at `offset` and spanning `len` bytes
    /// (delimiter included).
    pub(crate) fn observe(&mut self, rec: &LogRecord, offset: u64, len: u64) {
        if !rec.branch.is_empty() {
            self.last_branch.clone_from(&rec.branch);
        }
        if !rec.commit.is_empty() {
            self.last_commit.clone_from(&rec.commit);
        }

        match rec.kind {
            RecordKind::IterationStart => {
                self.pending = Some(Pending {
                    start: offset,
                    summary: IterationSummary {
                        number: rec.iteration,
                        mode: rec.mode.clone(),
                        cost: 0.0,
                        duration_ms: 0,
                        subtype: String::new(),
                        commit: String::new(),
                        started_at: rec.ts,
                        ended_at: rec.ts,
                    },
                });
            }
            RecordKind::IterationComplete => self.complete(rec, offset + len),
            _ => {}
        }
    }

    fn complete(&mut self, rec: &LogRecord, end: u64) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if rec.iteration != 0 && rec.iteration != pending.summary.number {
            self.pending = Some(pending);
            return;
        }

        let mut summary = pending.summary;
        if !rec.mode.is_empty() {
            summary.mode.clone_from(&rec.mode);
        }
        summary.cost = rec.cost;
        summary.duration_ms = rec.duration_ms;
        summary.subtype.clone_from(&rec.subtype);
        summary.commit.clone_from(&rec.commit);
        summary.ended_at = rec.ts;

        let number = summary.number;
        let range = IterationRange {
            start: pending.start,
            end,
        };
        if self.ranges.insert(number, range).is_some() {
            self.summaries.retain(|s| s.number != number);
        }
        self.summaries.push(summary);
    }

    pub(crate) fn range(&self, number: u32) -> Option<IterationRange> {
        self.ranges.get(&number).copied()
    }

    pub(crate) fn summaries(&self) -> &[IterationSummary] {
        &self.summaries
    }

    pub(crate) fn pending_iteration(&self) -> Option<u32> {
        self.pending.as_ref().map(|p| p.summary.number)
    }

    pub(crate) fn last_branch(&self) -> &str {
        &self.last_branch
    }

    pub(crate) fn last_commit(&self) -> &str {
        &self.last_commit
    }
}
