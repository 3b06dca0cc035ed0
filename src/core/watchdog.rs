//! # Hang detection around one workload invocation.
//!
//! ## Flow
//! ```text
//! hang_timeout == 0:
//!   workload.run(parent) ─► result
//!
//! hang_timeout == T:
//!   child = parent.child_token()
//!   spawn watch(child) ──► every T/4: silence >= T ? ─► publish HangDetected ─► child.cancel()
//!   workload.run(child) ─► result
//!   child.cancel() ─► join watch ─► result
//! ```
//!
//! ## Rules
//! - The watchdog never outlives [`run_watched`]: it is cancelled and joined before returning.
//! - A watchdog-initiated cancellation is always preceded by a `HangDetected` event.
//! - Child cancellation does **not** affect the caller's token.

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use super::regent::Shared;
use crate::{
    error::WorkloadError,
    events::{Event, EventKind},
    workload::Workload,
};

/// Shortest polling interval, for very small hang timeouts.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Runs `workload` once, cancelling it if it stays silent longer than the hang timeout.
pub(crate) async fn run_watched<W>(
    shared: &Arc<Shared>,
    parent: &CancellationToken,
    workload: &W,
) -> Result<(), WorkloadError>
where
    W: Workload + ?Sized,
{
    let Some(timeout) = shared.cfg.hang_timeout() else {
        return workload.run(parent.clone()).await;
    };

    let child = parent.child_token();
    let watchdog = tokio::spawn(watch(Arc::clone(shared), child.clone(), timeout));

    let res = workload.run(child.clone()).await;

    child.cancel();
    if let Err(err) = watchdog.await {
        tracing::warn!(error = %err, "hang watchdog task ended abnormally");
    }
    res
}

async fn watch(shared: Arc<Shared>, token: CancellationToken, timeout: Duration) {
    let tick = (timeout / 4).max(MIN_TICK);
    loop {
        select! {
            _ = token.cancelled() => return,
            _ = time::sleep(tick) => {}
        }

        let silence = shared.silence();
        if silence >= timeout {
            tracing::warn!(?silence, ?timeout, "no workload output, cancelling attempt");
            shared.emit(Event::new(EventKind::HangDetected).with_timeout(timeout));
            token.cancel();
            return;
        }
    }
}
