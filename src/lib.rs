//! # regent
//!
//! **Regent** supervises a long-running, cancelable workload (typically an
//! agent build loop) and keeps a durable, per-session log of everything it
//! emits.
//!
//! It retries failed attempts with a fixed backoff, cancels attempts that stay
//! silent for too long, optionally verifies the result with a test command and
//! reverts the last commit when the check fails, and snapshots its progress to
//! a state file that dashboards can read at any time.
//!
//! ## Architecture
//! ```text
//!                 ┌──────────────────────────────┐
//!   Workload ◄────┤  Regent::supervise            │
//!   (run(ctx))    │  - retry loop + backoff       │───► StateStore (.regent/state.json)
//!       │         │  - hang watchdog              │
//!       │         │  - verify_and_rollback ─────────► Verifier / VersionControl
//!       │         └──────────────┬───────────────┘
//!       │ LogRecord              │ publish(Event)
//!       ▼                        ▼
//!   DurableLog               Bus (bounded, drop-on-full)
//!   (.regent/logs/*.jsonl)       │
//!       ▲                        ▼
//!       │                  SubscriberSet::listen
//!       │                   ┌────┴────────┐
//!       └────────────── NoteRecorder   LogWriter (tracing)
//! ```
//!
//! ### Lifecycle
//! ```text
//! loop {
//!   ├─► token cancelled? ─► ShutdownRequested, Err(Canceled)
//!   ├─► attempt += 1, AttemptStarting{ attempt, max }
//!   ├─► run_watched(workload)
//!   │       ├─ Ok  ──► AttemptSucceeded ─► verify_and_rollback ─► Ok(())
//!   │       ├─ Err, token cancelled ──► ShutdownRequested, Err(Canceled)
//!   │       └─ Err ──► AttemptFailed
//!   │                  ├─ attempts > max_retries ─► GaveUp, Err(RetriesExhausted)
//!   │                  └─ BackoffScheduled ─► sleep (cancellable) ─► continue
//! }
//! ```
//!
//! ## Features
//! | Area            | Description                                           | Key types / traits                         |
//! |-----------------|-------------------------------------------------------|--------------------------------------------|
//! | **Supervision** | Retry, hang detection, verification and rollback.     | [`Regent`], [`RegentBuilder`], [`Config`]  |
//! | **Workloads**   | The supervised unit of work.                          | [`Workload`], [`WorkloadFn`]               |
//! | **Events**      | Status notes for dashboards and operators.            | [`Event`], [`EventKind`], [`Bus`]          |
//! | **Subscribers** | Fan-out of events to tracing and the session log.     | [`Subscribe`], [`SubscriberSet`]           |
//! | **Session log** | Append-only JSON lines with an iteration index.       | [`DurableLog`], [`LogRecord`]              |
//! | **State**       | Atomically written supervisor snapshot.               | [`SupervisorState`], [`StateStore`]        |
//! | **Errors**      | Typed errors for every fallible operation.            | [`RegentError`], [`LogError`]              |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use regent::{Config, Regent, VcsError, VersionControl, WorkloadFn};
//!
//! struct NoVcs;
//!
//! #[async_trait]
//! impl VersionControl for NoVcs {
//!     async fn current_branch(&self) -> Result<String, VcsError> { Ok("main".into()) }
//!     async fn last_commit(&self) -> Result<String, VcsError> { Ok(String::new()) }
//!     async fn revert(&self, _id: &str) -> Result<(), VcsError> { Ok(()) }
//!     async fn push(&self, _branch: &str) -> Result<(), VcsError> { Ok(()) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let regent = Regent::builder(Config::default(), Arc::new(NoVcs)).build();
//!
//!     let agent = {
//!         let regent = regent.clone();
//!         WorkloadFn::new("agent", move |ctx: CancellationToken| {
//!             let regent = regent.clone();
//!             async move {
//!                 if ctx.is_cancelled() {
//!                     return Err(regent::WorkloadError::Canceled);
//!                 }
//!                 regent.notify_output();
//!                 Ok(())
//!             }
//!         })
//!     };
//!
//!     regent.supervise(&CancellationToken::new(), &agent).await?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod ops;
mod session;
mod state;
mod subscribers;
mod workload;

// ---- Public re-exports ----

pub use core::{Config, LOGS_DIR, Regent, RegentBuilder, STATE_DIR, STATE_FILE};
pub use error::{LogError, RegentError, RollbackError, VcsError, VerifyError, WorkloadError};
pub use events::{Bus, Event, EventKind};
pub use ops::{ShellVerifier, Verification, Verifier, VersionControl, short_commit_id};
pub use session::{
    DurableLog, IterationRange, IterationSummary, LOG_EXTENSION, LogRecord, RecordKind, SessionId,
    SessionSummary, enforce_retention, list_sessions,
};
pub use state::{StateStore, SupervisorState};
pub use subscribers::{LogWriter, NoteRecorder, Subscribe, SubscriberSet};
pub use workload::{Workload, WorkloadFn};
