//! In-memory collaborators for tests.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{VcsError, VerifyError};
use crate::ops::{Verification, Verifier, VersionControl};

#[derive(Default)]
pub(crate) struct FakeVcs {
    commit: Mutex<String>,
    calls: Mutex<Vec<String>>,
    fail_revert: bool,
}

impl FakeVcs {
    pub(crate) fn with_commit(commit: &str) -> Self {
        Self {
            commit: Mutex::new(commit.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn failing_revert(mut self) -> Self {
        self.fail_revert = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VersionControl for FakeVcs {
    async fn current_branch(&self) -> Result<String, VcsError> {
        self.record("current_branch".into());
        Ok("main".into())
    }

    async fn last_commit(&self) -> Result<String, VcsError> {
        self.record("last_commit".into());
        Ok(self.commit.lock().unwrap().clone())
    }

    async fn revert(&self, id: &str) -> Result<(), VcsError> {
        self.record(format!("revert {id}"));
        if self.fail_revert {
            return Err(VcsError::Command {
                op: "revert",
                message: "conflict".into(),
            });
        }
        *self.commit.lock().unwrap() = format!("rev-{id} Revert {id}");
        Ok(())
    }

    async fn push(&self, branch: &str) -> Result<(), VcsError> {
        self.record(format!("push {branch}"));
        Ok(())
    }
}

pub(crate) enum Outcome {
    Pass,
    Fail(String),
    Unstartable,
}

pub(crate) struct FakeVerifier {
    outcome: Outcome,
    runs: Arc<AtomicU32>,
}

impl FakeVerifier {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            runs: Arc::new(AtomicU32::new(0)),
        }
    }

    pub(crate) fn passing() -> Self {
        Self::new(Outcome::Pass)
    }

    pub(crate) fn failing(output: &str) -> Self {
        Self::new(Outcome::Fail(output.to_string()))
    }

    pub(crate) fn unstartable() -> Self {
        Self::new(Outcome::Unstartable)
    }

    pub(crate) fn runs(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.runs)
    }
}

#[async_trait]
impl Verifier for FakeVerifier {
    async fn run(&self, _dir: &Path, command: &str) -> Result<Verification, VerifyError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Outcome::Pass => Ok(Verification {
                passed: true,
                output: "ok".into(),
            }),
            Outcome::Fail(output) => Ok(Verification {
                passed: false,
                output: output.clone(),
            }),
            Outcome::Unstartable => Err(VerifyError::Spawn {
                command: command.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "sh: not found"),
            }),
        }
    }
}
