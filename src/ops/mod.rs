//! External collaborators consumed by the supervisor.
//!
//! - [`VersionControl`] revert/push capability used for rollback
//! - [`Verifier`] post-iteration check, with [`ShellVerifier`] as the default

mod vcs;
mod verify;

pub use vcs::{VersionControl, short_commit_id};
pub use verify::{ShellVerifier, Verification, Verifier};
