//! # Post-iteration verification and rollback.
//!
//! Runs only when `rollback_on_failure` is set and a test command is configured.
//!
//! ```text
//! verifier.run(work_dir, test_command)
//!   ├─ Err            ─► RollbackError::Verify (could not start)
//!   ├─ passed         ─► VerificationPassed{ last_commit }
//!   └─ failed         ─► Reverting{ id } ─► revert(id) ─► push(current_branch) ─► Reverted{ new id }
//! ```
//!
//! Every error is returned to the supervisor, which reports it as a note; the
//! supervised run still counts as a success.

use super::regent::Regent;
use crate::{
    error::RollbackError,
    events::{Event, EventKind},
    ops::short_commit_id,
};

/// Lines of check output attached to the `Reverting` event.
const OUTPUT_TAIL_LINES: usize = 20;

impl Regent {
    pub(crate) async fn verify_and_rollback(&self) -> Result<(), RollbackError> {
        let shared = self.shared();
        let Some(command) = shared.cfg.verification_command() else {
            return Ok(());
        };

        let verdict = shared.verifier.run(&shared.cfg.work_dir, command).await?;

        if verdict.passed {
            let commit = match shared.vcs.last_commit().await {
                Ok(commit) => commit,
                Err(err) => {
                    tracing::debug!(error = %err, "last commit unavailable for verification note");
                    String::new()
                }
            };
            let mut ev = Event::new(EventKind::VerificationPassed);
            if !commit.is_empty() {
                ev = ev.with_commit(commit);
            }
            shared.emit(ev);
            return Ok(());
        }

        let commit = shared
            .vcs
            .last_commit()
            .await
            .map_err(RollbackError::LastCommit)?;
        let id = short_commit_id(&commit).to_string();
        shared.emit(
            Event::new(EventKind::Reverting)
                .with_commit(id.as_str())
                .with_reason(tail_lines(&verdict.output, OUTPUT_TAIL_LINES)),
        );

        shared
            .vcs
            .revert(&id)
            .await
            .map_err(|source| RollbackError::Revert {
                id: id.clone(),
                source,
            })?;
        let branch = shared
            .vcs
            .current_branch()
            .await
            .map_err(RollbackError::Push)?;
        shared.vcs.push(&branch).await.map_err(RollbackError::Push)?;

        let reverted = match shared.vcs.last_commit().await {
            Ok(commit) => {
                shared.update(|st| st.last_commit.clone_from(&commit));
                short_commit_id(&commit).to_string()
            }
            Err(_) => id,
        };
        shared.emit(Event::new(EventKind::Reverted).with_commit(reverted));
        Ok(())
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::core::Config;
    use crate::core::fakes::{FakeVcs, FakeVerifier};
    use crate::events::Bus;
    use crate::state::StateStore;
    use crate::workload::WorkloadFn;

    fn regent(vcs: Arc<FakeVcs>, verifier: FakeVerifier, dir: &std::path::Path) -> (Regent, mpsc::Receiver<Event>) {
        let cfg = Config {
            rollback_on_failure: true,
            test_command: "make test".into(),
            hang_timeout: Duration::ZERO,
            retry_backoff: Duration::ZERO,
            work_dir: dir.to_path_buf(),
            ..Config::default()
        };
        let (bus, rx) = Bus::channel(64);
        let regent = Regent::builder(cfg, vcs)
            .with_verifier(Arc::new(verifier))
            .with_bus(bus)
            .with_state_store(StateStore::new(dir.join("state.json")))
            .build();
        (regent, rx)
    }

    fn events(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn test_passing_check_keeps_commit() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::with_commit("abc123 add feature"));
        let (regent, mut rx) = regent(Arc::clone(&vcs), FakeVerifier::passing(), dir.path());

        regent.verify_and_rollback().await.unwrap();

        assert!(vcs.calls().iter().all(|c| !c.starts_with("revert")));
        let ev = events(&mut rx).pop().unwrap();
        assert_eq!(ev.kind, EventKind::VerificationPassed);
        assert_eq!(ev.message(), "tests passed, commit kept (abc123 add feature)");
    }

    #[tokio::test]
    async fn test_failing_check_reverts_and_pushes() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::with_commit("abc123 add feature"));
        let (regent, mut rx) = regent(Arc::clone(&vcs), FakeVerifier::failing("1 test failed"), dir.path());

        regent.verify_and_rollback().await.unwrap();

        assert_eq!(
            vcs.calls(),
            vec!["last_commit", "revert abc123", "current_branch", "push main", "last_commit"]
        );
        let evs = events(&mut rx);
        assert_eq!(evs[0].kind, EventKind::Reverting);
        assert_eq!(evs[0].commit.as_deref(), Some("abc123"));
        assert_eq!(evs[0].reason.as_deref(), Some("1 test failed"));
        assert_eq!(evs[1].kind, EventKind::Reverted);
        assert_eq!(evs[1].commit.as_deref(), Some("rev-abc123"));
        assert_eq!(regent.state().last_commit, "rev-abc123 Revert abc123");
    }

    #[tokio::test]
    async fn test_unstartable_check_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::with_commit("abc123 x"));
        let (regent, _rx) = regent(Arc::clone(&vcs), FakeVerifier::unstartable(), dir.path());

        let err = regent.verify_and_rollback().await.unwrap_err();
        assert_eq!(err.as_label(), "rollback_verify");
        assert!(vcs.calls().is_empty());
    }

    #[tokio::test]
    async fn test_revert_failure_does_not_fail_supervision() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::with_commit("abc123 x").failing_revert());
        let (regent, mut rx) = regent(Arc::clone(&vcs), FakeVerifier::failing("nope"), dir.path());

        let ok = WorkloadFn::new("ok", |_ctx: CancellationToken| async { Ok(()) });
        regent.supervise(&CancellationToken::new(), &ok).await.unwrap();

        assert!(!vcs.calls().iter().any(|c| c.starts_with("push")));
        let st = regent.state();
        assert!(st.passed);
        let note = events(&mut rx)
            .into_iter()
            .find(|e| e.kind == EventKind::Note)
            .unwrap();
        assert!(note.message().contains("revert of abc123 failed"));
    }

    #[tokio::test]
    async fn test_disabled_rollback_skips_verifier() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::default());
        let verifier = FakeVerifier::failing("should not run");
        let runs = verifier.runs();
        let cfg = Config {
            test_command: "make test".into(),
            work_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let regent = Regent::builder(cfg, vcs)
            .with_verifier(Arc::new(verifier))
            .with_state_store(StateStore::new(dir.path().join("state.json")))
            .build();

        regent.verify_and_rollback().await.unwrap();
        assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_tail_lines() {
        assert_eq!(tail_lines("a\nb\nc", 2), "b\nc");
        assert_eq!(tail_lines("a", 5), "a");
        assert_eq!(tail_lines("", 5), "");
    }
}
