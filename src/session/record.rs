//! # Session log records.
//!
//! A [`LogRecord`] is one event emitted by the workload (or a supervisor note
//! relayed by the host). Records are stored as one JSON object per line; the
//! `kind` field discriminates them and zero-valued payload fields are omitted.
//!
//! ```text
//! {"kind":"iteration_start","ts":"2026-10-18T09:12:03Z","iteration":4,"mode":"build"}
//! {"kind":"tool_use","ts":"2026-10-18T09:12:05Z","tool_name":"Edit","tool_input":"src/lib.rs"}
//! {"kind":"iteration_complete","ts":"2026-10-18T09:14:41Z","iteration":4,"cost":0.42,...}
//! ```

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Record discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    IterationStart,
    ToolUse,
    Text,
    IterationComplete,
    Error,
    GitPull,
    GitPush,
    Done,
    Stopped,
    SupervisorNote,
}

/// One workload event.
///
/// Zero values mean "not set": `iteration == 0`, `cost == 0.0`, empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub kind: RecordKind,
    pub ts: Timestamp,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub iteration: u32,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub cost: f64,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub duration_ms: u64,
    /// Exit subtype of a completed iteration (`success`, `error_max_turns`, ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtype: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool_input: String,
    /// Commit as `"<id> <subject>"`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub commit: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl LogRecord {
    /// Creates an empty record of `kind` stamped with the current time.
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            ts: Timestamp::now(),
            iteration: 0,
            cost: 0.0,
            duration_ms: 0,
            subtype: String::new(),
            tool_name: String::new(),
            tool_input: String::new(),
            commit: String::new(),
            branch: String::new(),
            mode: String::new(),
            message: String::new(),
        }
    }

    /// Creates an `iteration_start` record.
    pub fn iteration_start(iteration: u32, mode: impl Into<String>) -> Self {
        Self::new(RecordKind::IterationStart)
            .with_iteration(iteration)
            .with_mode(mode)
    }

    /// Creates an `iteration_complete` record.
    pub fn iteration_complete(iteration: u32, cost: f64) -> Self {
        Self::new(RecordKind::IterationComplete)
            .with_iteration(iteration)
            .with_cost(cost)
    }

    /// Creates a `supervisor_note` record.
    pub fn note(message: impl Into<String>) -> Self {
        Self::new(RecordKind::SupervisorNote).with_message(message)
    }

    pub fn with_ts(mut self, ts: Timestamp) -> Self {
        self.ts = ts;
        self
    }

    pub fn with_iteration(mut self, n: u32) -> Self {
        self.iteration = n;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = subtype.into();
        self
    }

    pub fn with_tool(mut self, name: impl Into<String>, input: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self.tool_input = input.into();
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = commit.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}
