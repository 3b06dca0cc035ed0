//! # Supervisor configuration.
//!
//! Provides [`Config`], the settings consumed by [`Regent`](crate::Regent).
//! Loading it from a file or the command line is left to the host process.
//!
//! ## Sentinel values
//! - `hang_timeout = 0s` → hang detection disabled
//! - `retry_backoff = 0s` → immediate retry
//! - `test_command = ""` → no post-iteration verification
//! - `log_retention = 0` → keep every session log

use std::path::PathBuf;
use std::time::Duration;

/// Directory (relative to the work dir) holding regent's own files.
pub const STATE_DIR: &str = ".regent";
/// File name of the persisted supervisor state inside [`STATE_DIR`].
pub const STATE_FILE: &str = "state.json";
/// Directory name of the session logs inside [`STATE_DIR`].
pub const LOGS_DIR: &str = "logs";

/// Configuration for one supervisor.
///
/// ## Field semantics
/// - `max_retries`: consecutive failures tolerated before giving up (`0` = single attempt)
/// - `retry_backoff`: pause between a failed attempt and the next one
/// - `hang_timeout`: maximum silence from the workload before it is cancelled (`0s` = off)
/// - `rollback_on_failure`: revert the last commit when verification fails
/// - `test_command`: shell command run after a successful workload
/// - `log_retention`: number of session logs kept by retention (`0` = unlimited)
/// - `bus_capacity`: event queue size (min 1)
/// - `work_dir`: repository root; state and logs live under [`STATE_DIR`]
#[derive(Clone, Debug)]
pub struct Config {
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub hang_timeout: Duration,
    pub rollback_on_failure: bool,
    pub test_command: String,
    pub log_retention: usize,
    pub bus_capacity: usize,
    pub work_dir: PathBuf,
}

impl Config {
    /// Returns the hang timeout as an `Option`.
    ///
    /// - `None` → no watchdog
    /// - `Some(d)` → workload cancelled after `d` without output
    #[inline]
    pub fn hang_timeout(&self) -> Option<Duration> {
        if self.hang_timeout == Duration::ZERO {
            None
        } else {
            Some(self.hang_timeout)
        }
    }

    /// Returns the verification command when rollback is enabled and a command is set.
    #[inline]
    pub fn verification_command(&self) -> Option<&str> {
        let cmd = self.test_command.trim();
        if self.rollback_on_failure && !cmd.is_empty() {
            Some(cmd)
        } else {
            None
        }
    }

    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Path of the persisted supervisor state.
    pub fn state_path(&self) -> PathBuf {
        self.work_dir.join(STATE_DIR).join(STATE_FILE)
    }

    /// Directory holding the session logs.
    pub fn logs_dir(&self) -> PathBuf {
        self.work_dir.join(STATE_DIR).join(LOGS_DIR)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_retries = 3`
    /// - `retry_backoff = 30s`
    /// - `hang_timeout = 10m`
    /// - `rollback_on_failure = false`, empty `test_command`
    /// - `log_retention = 20`
    /// - `bus_capacity = 256`
    /// - `work_dir = "."`
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff: Duration::from_secs(30),
            hang_timeout: Duration::from_secs(600),
            rollback_on_failure: false,
            test_command: String::new(),
            log_retention: 20,
            bus_capacity: 256,
            work_dir: PathBuf::from("."),
        }
    }
}
