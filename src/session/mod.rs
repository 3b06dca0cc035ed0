//! # Durable session log.
//!
//! Everything the workload emits is appended here, one JSON line per
//! [`LogRecord`], and completed iterations are indexed by byte range.
//!
//! ## Contents
//! - [`DurableLog`] append / read-back / summaries
//! - [`LogRecord`], [`RecordKind`] the record format
//! - [`IterationSummary`], [`SessionSummary`] derived views
//! - [`enforce_retention`], [`list_sessions`] housekeeping of old session files

mod index;
mod log;
mod record;
mod retention;
mod summary;

pub use index::IterationRange;
pub use log::{DurableLog, LOG_EXTENSION, SessionId};
pub use record::{LogRecord, RecordKind};
pub use retention::{enforce_retention, list_sessions};
pub use summary::{IterationSummary, SessionSummary};
