//! # Status events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies every status transition of a
//! [`Regent`](crate::Regent) run:
//! - **Attempt events**: starting, succeeded, failed, hang detected, backoff
//! - **Terminal events**: gave up, shutdown requested
//! - **Verification events**: tests passed, reverting, reverted
//! - **Notes**: anything else worth telling the operator (persistence errors, ...)
//!
//! [`Event::message`] renders the human-readable note shown by dashboards.
//!
//! ## Ordering guarantees
//! Each event has a process-wide sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use regent::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_attempt(2)
//!     .with_delay(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.message(), "retrying in 5s (after attempt 2)");
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use jiff::Timestamp;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of supervisor events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// An attempt is about to run.
    ///
    /// Sets `attempt` (1-based) and `max_attempts`.
    AttemptStarting,

    /// The workload returned success.
    ///
    /// Sets `attempt`.
    AttemptSucceeded,

    /// The workload returned an error (retryable).
    ///
    /// Sets `attempt`, `reason`.
    AttemptFailed,

    /// The watchdog saw no output for `timeout_ms` and cancelled the workload.
    ///
    /// Sets `timeout_ms`.
    HangDetected,

    /// Next attempt scheduled after a failure.
    ///
    /// Sets `attempt` (the failed one), `delay_ms`.
    BackoffScheduled,

    /// Retry budget exhausted.
    ///
    /// Sets `attempt` (total attempts), `reason` (last error).
    GaveUp,

    /// Caller cancelled supervision.
    ShutdownRequested,

    /// Verification passed; the commit is kept.
    ///
    /// Sets `commit`.
    VerificationPassed,

    /// Verification failed; the last commit is being reverted.
    ///
    /// Sets `commit` (short id), `reason` (captured check output).
    Reverting,

    /// Revert committed and pushed.
    ///
    /// Sets `commit` (resulting id).
    Reverted,

    /// Free-form operator note.
    ///
    /// Sets `reason`.
    Note,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::AttemptStarting => "attempt-starting",
            EventKind::AttemptSucceeded => "attempt-succeeded",
            EventKind::AttemptFailed => "attempt-failed",
            EventKind::HangDetected => "hang-detected",
            EventKind::BackoffScheduled => "backoff-scheduled",
            EventKind::GaveUp => "gave-up",
            EventKind::ShutdownRequested => "shutdown-requested",
            EventKind::VerificationPassed => "verification-passed",
            EventKind::Reverting => "reverting",
            EventKind::Reverted => "reverted",
            EventKind::Note => "note",
        }
    }
}

/// Supervisor event with optional metadata.
///
/// - `seq`: monotonic process-wide sequence
/// - `at`: wall-clock timestamp
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    pub seq: u64,
    pub at: Timestamp,
    pub kind: EventKind,

    /// Attempt number (1-based).
    pub attempt: Option<u32>,
    /// Total attempts allowed (`max_retries + 1`).
    pub max_attempts: Option<u32>,
    /// Backoff delay in milliseconds.
    pub delay_ms: Option<u64>,
    /// Hang timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Commit identifier.
    pub commit: Option<Arc<str>>,
    /// Human-readable reason (errors, notes, check output).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: Timestamp::now(),
            kind,
            attempt: None,
            max_attempts: None,
            delay_ms: None,
            timeout_ms: None,
            commit: None,
            reason: None,
        }
    }

    /// Creates a [`EventKind::Note`] event.
    pub fn note(reason: impl Into<Arc<str>>) -> Self {
        Event::new(EventKind::Note).with_reason(reason)
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(duration_ms(d));
        self
    }

    /// Attaches a hang timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(duration_ms(d));
        self
    }

    #[inline]
    pub fn with_commit(mut self, commit: impl Into<Arc<str>>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Renders the event as a one-line operator note.
    pub fn message(&self) -> String {
        let reason = self.reason.as_deref().unwrap_or("");
        let commit = self.commit.as_deref().unwrap_or("unknown");
        let attempt = self.attempt.unwrap_or(0);
        match self.kind {
            EventKind::AttemptStarting => match self.max_attempts {
                Some(max) => format!("starting attempt {attempt}/{max}"),
                None => format!("starting attempt {attempt}"),
            },
            EventKind::AttemptSucceeded => format!("attempt {attempt} succeeded"),
            EventKind::AttemptFailed => format!("attempt {attempt} failed: {reason}"),
            EventKind::HangDetected => format!(
                "hang detected: no output for {}, cancelling",
                fmt_ms(self.timeout_ms.unwrap_or(0))
            ),
            EventKind::BackoffScheduled => format!(
                "retrying in {} (after attempt {attempt})",
                fmt_ms(self.delay_ms.unwrap_or(0))
            ),
            EventKind::GaveUp => format!("giving up after {attempt} attempts: {reason}"),
            EventKind::ShutdownRequested => "shutdown requested, stopping".to_string(),
            EventKind::VerificationPassed => format!("tests passed, commit kept ({commit})"),
            EventKind::Reverting => format!("tests failed, reverting {commit}"),
            EventKind::Reverted => format!("reverted and pushed: {commit}"),
            EventKind::Note => reason.to_string(),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

fn fmt_ms(ms: u64) -> String {
    if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{ms}ms")
    }
}
