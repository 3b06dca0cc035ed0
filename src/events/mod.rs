//! Supervisor events: types and bounded bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] bounded drop-on-full queue over `tokio::sync::mpsc`
//!
//! ## Quick reference
//! - **Publishers**: `Regent::supervise`, the hang watchdog, the rollback step.
//! - **Consumers**: whatever the host attaches to the receiver, typically
//!   [`SubscriberSet::listen`](crate::SubscriberSet::listen).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
