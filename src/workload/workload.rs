//! # Workload abstraction.
//!
//! A [`Workload`] is the opaque unit of work a [`Regent`](crate::Regent) runs:
//! typically one session of an external coding agent looping over a plan.
//! It receives a [`CancellationToken`] and must stop promptly once it fires,
//! because that is how both shutdown and the hang watchdog reach it.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkloadError;

/// # Asynchronous, cancelable unit of supervised work.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use regent::{Workload, WorkloadError};
///
/// struct Build;
///
/// #[async_trait]
/// impl Workload for Build {
///     fn name(&self) -> &str { "build" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), WorkloadError> {
///         if ctx.is_cancelled() {
///             return Err(WorkloadError::Canceled);
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Workload: Send + Sync {
    /// Returns a stable, human-readable name.
    fn name(&self) -> &str;

    /// Runs until completion, failure, or cancellation.
    ///
    /// `Ok(())` means success. On cancellation return [`WorkloadError::Canceled`].
    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkloadError>;
}
