//! # Workload abstractions.
//!
//! - [`Workload`] - trait for implementing async cancelable workloads
//! - [`WorkloadFn`] - closure-backed implementation

mod workload;
mod workload_fn;

pub use workload::Workload;
pub use workload_fn::WorkloadFn;
