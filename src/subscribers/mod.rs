//! # Event subscribers.
//!
//! Supervisor events flow from the [`Bus`](crate::events::Bus) receiver into a
//! [`SubscriberSet`], which fans them out to independent workers.
//!
//! ```text
//! Regent ── publish(Event) ──► Bus ──► Receiver ──► SubscriberSet::listen
//!                                                        │
//!                                             ┌──────────┼───────────┐
//!                                             ▼          ▼           ▼
//!                                         LogWriter  NoteRecorder  Custom
//!                                         (tracing)  (session log)
//! ```
//!
//! - [`LogWriter`]: structured `tracing` output.
//! - [`NoteRecorder`]: `supervisor_note` records in a [`DurableLog`](crate::session::DurableLog).

mod log;
mod recorder;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use recorder::NoteRecorder;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
