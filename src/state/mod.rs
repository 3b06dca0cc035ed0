//! Supervisor state: the snapshot type and its atomic file store.

mod snapshot;
mod store;

pub use snapshot::SupervisorState;
pub use store::StateStore;
