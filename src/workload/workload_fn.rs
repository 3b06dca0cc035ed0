//! # Function-backed workload (`WorkloadFn`)
//!
//! [`WorkloadFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per attempt. Retries never share hidden state; if attempts need shared
//! state, capture an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use regent::{Workload, WorkloadFn, WorkloadError};
//!
//! let w = WorkloadFn::new("loop", |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(WorkloadError::Canceled);
//!     }
//!     Ok(())
//! });
//!
//! assert_eq!(w.name(), "loop");
//! ```

use std::borrow::Cow;
use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkloadError;
use crate::workload::Workload;

/// Function-backed workload.
#[derive(Debug)]
pub struct WorkloadFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> WorkloadFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> Workload for WorkloadFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), WorkloadError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkloadError> {
        (self.f)(ctx).await
    }
}
