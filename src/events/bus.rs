//! # Event bus for supervisor status events.
//!
//! [`Bus`] is a thin wrapper around a bounded [`tokio::sync::mpsc`] queue that
//! provides non-blocking publishing from the supervisor and its watchdog.
//!
//! ## Architecture
//! ```text
//! Publishers:                         Consumer (one):
//!   Regent   ──┐
//!   Watchdog ──┼──────► Bus ───────► host (dashboard, SubscriberSet::listen, ...)
//!              │   (bounded queue)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` uses `try_send` and never awaits.
//! - **Drop on full**: when the queue is full the *new* event is discarded and counted.
//! - **Best effort**: status reporting never stalls supervision.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use super::event::Event;

/// Bounded, drop-on-full queue for supervisor events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Cloneable**: clones share the same queue and drop counter.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: Option<mpsc::Sender<Event>>,
    dropped: Arc<AtomicU64>,
}

impl Bus {
    /// Creates a bus and the receiving end of its queue.
    ///
    /// The minimum capacity is 1 (clamped).
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let bus = Self {
            tx: Some(tx),
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (bus, rx)
    }

    /// Creates a bus without a consumer; every event is discarded.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publishes an event without waiting.
    ///
    /// - If the queue is full, the event is dropped and counted.
    /// - If the receiver is gone, the event is dropped silently.
    pub fn publish(&self, ev: Event) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(ev) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(ev)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(kind = ev.kind.as_label(), seq = ev.seq, "event queue full, dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Number of events dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn test_full_queue_drops_newest() {
        let (bus, mut rx) = Bus::channel(2);
        bus.publish(Event::note("one"));
        bus.publish(Event::note("two"));
        bus.publish(Event::note("three"));

        assert_eq!(bus.dropped(), 1);
        assert_eq!(rx.try_recv().unwrap().reason.as_deref(), Some("one"));
        assert_eq!(rx.try_recv().unwrap().reason.as_deref(), Some("two"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_or_disabled_bus_never_fails() {
        let (bus, rx) = Bus::channel(1);
        drop(rx);
        bus.publish(Event::new(EventKind::ShutdownRequested));
        assert_eq!(bus.dropped(), 0);

        let bus = Bus::disabled();
        bus.publish(Event::note("ignored"));
        assert_eq!(bus.dropped(), 0);
    }
}
