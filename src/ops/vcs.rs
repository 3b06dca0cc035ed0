//! # Version-control capability used for rollback.
//!
//! The supervisor only needs four operations. Concrete implementations (a git
//! command wrapper, a test fake) live with the host.

use async_trait::async_trait;

use crate::error::VcsError;

/// Version-control operations consumed by the rollback step.
///
/// Calls from the supervisor are sequential (`revert` then `push`), never concurrent.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Name of the checked-out branch.
    async fn current_branch(&self) -> Result<String, VcsError>;

    /// Last commit as `"<id> <subject>"`.
    async fn last_commit(&self) -> Result<String, VcsError>;

    /// Creates a commit reverting `id`.
    async fn revert(&self, id: &str) -> Result<(), VcsError>;

    /// Pushes `branch` to its upstream.
    async fn push(&self, branch: &str) -> Result<(), VcsError>;
}

/// Extracts the commit id from a `"<id> <subject>"` string.
///
/// Returns the text before the first space, or the whole (trimmed) string.
///
/// # Example
/// ```
/// use regent::short_commit_id;
///
/// assert_eq!(short_commit_id("a1b2c3 fix parser"), "a1b2c3");
/// assert_eq!(short_commit_id("a1b2c3"), "a1b2c3");
/// ```
pub fn short_commit_id(commit: &str) -> &str {
    let commit = commit.trim();
    match commit.split_once(' ') {
        Some((id, _)) => id,
        None => commit,
    }
}
