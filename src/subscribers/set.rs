//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple subscribers
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and logged (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow (events are dropped for that
//!   subscriber).
//!
//! ## Diagram
//! ```text
//!  Bus ─► Receiver ─► listen()
//!                        │                 (Arc-clone per subscriber)
//!                        ├────────► [queue S1] ─► worker S1 ─► on_event()
//!                        └────────► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use regent::{Bus, LogWriter, SubscriberSet};
//!
//! # async fn demo() {
//! let (bus, rx) = Bus::channel(256);
//! let set = SubscriberSet::new(vec![Arc::new(LogWriter) as Arc<dyn regent::Subscribe>]);
//! let relay = tokio::spawn(set.listen(rx));
//! // hand `bus` to the RegentBuilder; dropping every Bus clone ends the relay
//! drop(bus);
//! relay.await.ok();
//! # }
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use super::Subscribe;
use crate::events::Event;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        tracing::error!(subscriber = name, ?panic, "subscriber panicked");
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fans one event out to all subscribers (non-blocking).
    ///
    /// A full or closed queue drops the event for that subscriber only.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = channel.name, seq = ev.seq, "queue full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(subscriber = channel.name, seq = ev.seq, "worker closed, event dropped");
                }
            }
        }
    }

    /// Relays every event from `rx` until all senders are gone, then shuts down.
    pub async fn listen(self, mut rx: mpsc::Receiver<Event>) {
        while let Some(ev) = rx.recv().await {
            self.emit(&ev);
        }
        self.shutdown().await;
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            if let Err(err) = h.await {
                tracing::warn!(error = %err, "subscriber worker ended abnormally");
            }
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}
