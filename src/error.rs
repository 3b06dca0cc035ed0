//! Error types used by the regent supervisor, the session log and their collaborators.
//!
//! - [`WorkloadError`]: errors returned by one workload invocation.
//! - [`RegentError`]: terminal errors returned by [`Regent::supervise`](crate::Regent::supervise).
//! - [`RollbackError`]: failures of the post-iteration verification step (never fatal).
//! - [`LogError`]: failures of the durable session log.
//! - [`VcsError`], [`VerifyError`]: failures reported by the external collaborators.
//!
//! Every enum provides `as_label` (stable snake_case label for logs/metrics).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// # Errors produced by a single workload invocation.
///
/// A workload that observes its cancellation token should return
/// [`WorkloadError::Canceled`]. Whether that cancellation came from the caller
/// or from the hang watchdog is decided by the supervisor, not the workload.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkloadError {
    /// The workload ran and failed; it may succeed if retried.
    #[error("workload failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The workload stopped because its cancellation token fired.
    #[error("context cancelled")]
    Canceled,
}

impl WorkloadError {
    /// Shorthand for [`WorkloadError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        WorkloadError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use regent::WorkloadError;
    ///
    /// assert_eq!(WorkloadError::fail("boom").as_label(), "workload_failed");
    /// assert_eq!(WorkloadError::Canceled.as_label(), "workload_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkloadError::Fail { .. } => "workload_failed",
            WorkloadError::Canceled => "workload_canceled",
        }
    }
}

/// # Terminal errors returned from supervision.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegentError {
    /// The caller's cancellation token fired. Never counted as a failure.
    #[error("supervision cancelled")]
    Canceled,

    /// Consecutive failures exceeded the configured retry budget.
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made (including the first one).
        attempts: u32,
        /// The error of the final attempt.
        #[source]
        last: WorkloadError,
    },
}

impl RegentError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegentError::Canceled => "regent_canceled",
            RegentError::RetriesExhausted { .. } => "regent_retries_exhausted",
        }
    }

    /// Returns `true` if supervision ended because of cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, RegentError::Canceled)
    }
}

/// # Errors reported by a [`VersionControl`](crate::VersionControl) implementation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum VcsError {
    /// The version-control command ran and reported a failure.
    #[error("{op} failed: {message}")]
    Command {
        /// Operation name (`revert`, `push`, ...).
        op: &'static str,
        /// Captured error output.
        message: String,
    },

    /// The version-control command could not be run at all.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl VcsError {
    pub fn as_label(&self) -> &'static str {
        match self {
            VcsError::Command { .. } => "vcs_command",
            VcsError::Io(_) => "vcs_io",
        }
    }
}

/// # Errors reported by a [`Verifier`](crate::Verifier).
///
/// Reserved for "could not start"; a failing check is a normal
/// [`Verification`](crate::Verification) with `passed == false`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The verification command could not be spawned.
    #[error("could not start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl VerifyError {
    pub fn as_label(&self) -> &'static str {
        match self {
            VerifyError::Spawn { .. } => "verify_spawn",
        }
    }
}

/// # Failures of the post-iteration verification/rollback step.
///
/// The supervisor reports these as notes; they never fail supervision.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RollbackError {
    /// The verification command could not be started.
    #[error("verification could not run: {0}")]
    Verify(#[from] VerifyError),

    /// The last commit could not be determined.
    #[error("could not read last commit: {0}")]
    LastCommit(#[source] VcsError),

    /// `revert` failed.
    #[error("revert of {id} failed: {source}")]
    Revert {
        id: String,
        #[source]
        source: VcsError,
    },

    /// `current_branch` or `push` failed after a successful revert.
    #[error("push of revert failed: {0}")]
    Push(#[source] VcsError),
}

impl RollbackError {
    pub fn as_label(&self) -> &'static str {
        match self {
            RollbackError::Verify(_) => "rollback_verify",
            RollbackError::LastCommit(_) => "rollback_last_commit",
            RollbackError::Revert { .. } => "rollback_revert",
            RollbackError::Push(_) => "rollback_push",
        }
    }
}

/// # Errors produced by the durable session log.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LogError {
    /// Underlying file I/O failed.
    #[error("session log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record could not be serialized.
    #[error("encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The iteration has no completed byte range in this session.
    #[error("iteration {0} not found")]
    IterationNotFound(u32),
}

impl LogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LogError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LogError::Io { .. } => "log_io",
            LogError::Encode(_) => "log_encode",
            LogError::IterationNotFound(_) => "log_iteration_not_found",
        }
    }

    /// Returns `true` for [`LogError::IterationNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, LogError::IterationNotFound(_))
    }
}
