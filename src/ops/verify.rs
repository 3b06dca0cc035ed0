//! # Verification runner.
//!
//! [`Verifier`] runs the configured check after a successful workload. The
//! default [`ShellVerifier`] executes the command through `sh -c` in the work
//! directory and captures its combined output.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::VerifyError;

/// Outcome of one verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub passed: bool,
    /// Captured stdout followed by stderr.
    pub output: String,
}

/// Runs a verification command.
///
/// `Err` is reserved for "could not start"; a failing check is `Ok` with `passed == false`.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn run(&self, dir: &Path, command: &str) -> Result<Verification, VerifyError>;
}

/// [`Verifier`] backed by `sh -c <command>`.
#[derive(Debug, Default, Clone)]
pub struct ShellVerifier;

#[async_trait]
impl Verifier for ShellVerifier {
    async fn run(&self, dir: &Path, command: &str) -> Result<Verification, VerifyError> {
        let out = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| VerifyError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));
        Ok(Verification {
            passed: out.status.success(),
            output,
        })
    }
}
