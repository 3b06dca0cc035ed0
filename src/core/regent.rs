//! # Regent: supervises one workload with retries, hang detection and rollback.
//!
//! ## Lifecycle
//! ```text
//! supervise(token, workload)
//!   ├─► state = SupervisorState::start(pid) ─► persist
//!   loop {
//!   ├─► token cancelled? ─► ShutdownRequested ─► Err(Canceled)
//!   ├─► publish AttemptStarting{ attempt, max_attempts }
//!   ├─► watchdog::run_watched(workload) ───► workload.run(child_token)
//!   │       │
//!   │       ├─ Ok  ──► consecutive_errors = 0 ─► persist
//!   │       │          ├─► verify_and_rollback()   (errors become notes)
//!   │       │          └─► finish(passed = true) ─► persist ─► Ok(())
//!   │       │
//!   │       └─ Err ──► token cancelled? ─► Err(Canceled)   (not counted)
//!   │                  ├─► consecutive_errors += 1 ─► persist ─► AttemptFailed
//!   │                  ├─► errors > max_retries ─► GaveUp ─► finish(false) ─► Err(RetriesExhausted)
//!   │                  └─► BackoffScheduled ─► sleep(retry_backoff) (cancellable)
//!   }
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially**; exactly one watchdog task lives per attempt.
//! - Cancellation from the caller is terminal and never consumes retry budget.
//! - A hang surfaces as a workload error while the caller's token is still live,
//!   so it is retried like any other failure.
//! - Persistence failures are reported as notes and never stop supervision.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use jiff::Timestamp;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use super::{Config, builder::RegentBuilder, watchdog};
use crate::{
    error::RegentError,
    events::{Bus, Event, EventKind},
    ops::{Verifier, VersionControl},
    session::LogRecord,
    state::{StateStore, SupervisorState},
    workload::Workload,
};

/// Live state plus the monotonic instant of the last observed output.
struct Tracked {
    state: SupervisorState,
    last_output: time::Instant,
}

pub(crate) struct Shared {
    pub(crate) cfg: Config,
    pub(crate) bus: Bus,
    pub(crate) vcs: Arc<dyn VersionControl>,
    pub(crate) verifier: Arc<dyn Verifier>,
    store: StateStore,
    tracked: Mutex<Tracked>,
    /// Serializes state-file writes so the last write carries the freshest snapshot.
    save_lock: Mutex<()>,
}

impl Shared {
    pub(crate) fn emit(&self, ev: Event) {
        self.bus.publish(ev);
    }

    fn tracked(&self) -> MutexGuard<'_, Tracked> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn touch_output(&self) {
        let mut t = self.tracked();
        t.last_output = time::Instant::now();
        t.state.last_output_at = Some(Timestamp::now());
    }

    /// Time since the last observed output.
    pub(crate) fn silence(&self) -> Duration {
        self.tracked().last_output.elapsed()
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut SupervisorState) -> R) -> R {
        f(&mut self.tracked().state)
    }

    pub(crate) fn snapshot(&self) -> SupervisorState {
        self.tracked().state.clone()
    }

    pub(crate) fn persist(&self) {
        let _writer = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.snapshot();
        if let Err(err) = self.store.save(&snapshot) {
            tracing::warn!(path = %self.store.path().display(), error = %err, "failed to persist supervisor state");
            self.emit(Event::note(format!("state save failed: {err}")));
        }
    }
}

/// Supervisor for one long-running workload.
///
/// Cheap to clone; clones share state, so a workload can hold one to call
/// [`notify_output`](Regent::notify_output) and [`update_state`](Regent::update_state).
#[derive(Clone)]
pub struct Regent {
    shared: Arc<Shared>,
}

impl Regent {
    /// Starts building a regent with the given configuration and version control.
    pub fn builder(cfg: Config, vcs: Arc<dyn VersionControl>) -> RegentBuilder {
        RegentBuilder::new(cfg, vcs)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        store: StateStore,
        vcs: Arc<dyn VersionControl>,
        verifier: Arc<dyn Verifier>,
    ) -> Self {
        let shared = Shared {
            cfg,
            bus,
            vcs,
            verifier,
            store,
            tracked: Mutex::new(Tracked {
                state: SupervisorState::default(),
                last_output: time::Instant::now(),
            }),
            save_lock: Mutex::new(()),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    pub fn bus(&self) -> &Bus {
        &self.shared.bus
    }

    /// A consistent copy of the live state.
    pub fn state(&self) -> SupervisorState {
        self.shared.snapshot()
    }

    /// Records that the workload produced output; feeds the hang watchdog.
    pub fn notify_output(&self) {
        self.shared.touch_output();
    }

    /// Records output and merges the non-zero progress fields of `rec` into the state.
    ///
    /// The state file is rewritten only when a field actually changed.
    pub fn update_state(&self, rec: &LogRecord) {
        self.shared.touch_output();
        if self.shared.update(|st| st.merge(rec)) {
            self.shared.persist();
        }
    }

    /// Runs `workload` until it succeeds, `token` is cancelled, or retries run out.
    pub async fn supervise<W>(&self, token: &CancellationToken, workload: &W) -> Result<(), RegentError>
    where
        W: Workload + ?Sized,
    {
        let shared = &self.shared;
        let max_retries = shared.cfg.max_retries;
        let max_attempts = max_retries.saturating_add(1);

        shared.update(|st| *st = SupervisorState::start(std::process::id()));
        shared.touch_output();
        shared.persist();

        loop {
            if token.is_cancelled() {
                return Err(self.shutdown());
            }

            let attempt = shared.update(|st| st.consecutive_errors) + 1;
            shared.emit(
                Event::new(EventKind::AttemptStarting)
                    .with_attempt(attempt)
                    .with_max_attempts(max_attempts),
            );
            tracing::debug!(workload = workload.name(), attempt, max_attempts, "starting attempt");

            shared.touch_output();
            match watchdog::run_watched(shared, token, workload).await {
                Ok(()) => {
                    shared.update(|st| st.consecutive_errors = 0);
                    shared.persist();
                    shared.emit(Event::new(EventKind::AttemptSucceeded).with_attempt(attempt));

                    if let Err(err) = self.verify_and_rollback().await {
                        tracing::warn!(error = %err, label = err.as_label(), "post-iteration verification failed");
                        shared.emit(Event::note(format!("verification step failed: {err}")));
                    }

                    shared.update(|st| st.finish(true));
                    shared.persist();
                    return Ok(());
                }
                Err(err) => {
                    if token.is_cancelled() {
                        return Err(self.shutdown());
                    }

                    let errors = shared.update(|st| {
                        st.consecutive_errors += 1;
                        st.consecutive_errors
                    });
                    shared.persist();
                    shared.emit(
                        Event::new(EventKind::AttemptFailed)
                            .with_attempt(attempt)
                            .with_reason(err.to_string()),
                    );

                    if errors > max_retries {
                        shared.emit(
                            Event::new(EventKind::GaveUp)
                                .with_attempt(errors)
                                .with_reason(err.to_string()),
                        );
                        shared.update(|st| st.finish(false));
                        shared.persist();
                        return Err(RegentError::RetriesExhausted {
                            attempts: errors,
                            last: err,
                        });
                    }

                    let delay = shared.cfg.retry_backoff;
                    shared.emit(
                        Event::new(EventKind::BackoffScheduled)
                            .with_attempt(attempt)
                            .with_delay(delay),
                    );

                    let sleep = time::sleep(delay);
                    tokio::pin!(sleep);
                    select! {
                        _ = &mut sleep => {}
                        _ = token.cancelled() => {
                            return Err(self.shutdown());
                        }
                    }
                }
            }
        }
    }

    /// Publishes the shutdown note, records the run as finished, and returns the cancellation error.
    fn shutdown(&self) -> RegentError {
        self.shared.emit(Event::new(EventKind::ShutdownRequested));
        self.shared.update(|st| st.finish(false));
        self.shared.persist();
        RegentError::Canceled
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::sync::mpsc;

    use super::*;
    use crate::core::fakes::{FakeVcs, FakeVerifier};
    use crate::error::WorkloadError;
    use crate::session::RecordKind;
    use crate::workload::WorkloadFn;

    struct Harness {
        regent: Regent,
        rx: mpsc::Receiver<Event>,
        store: StateStore,
        _dir: tempfile::TempDir,
    }

    fn harness(cfg: Config) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            work_dir: dir.path().to_path_buf(),
            ..cfg
        };
        let store = StateStore::new(cfg.state_path());
        let (bus, rx) = Bus::channel(256);
        let regent = Regent::builder(cfg, Arc::new(FakeVcs::default()))
            .with_verifier(Arc::new(FakeVerifier::passing()))
            .with_bus(bus)
            .build();
        Harness {
            regent,
            rx,
            store,
            _dir: dir,
        }
    }

    fn base_cfg() -> Config {
        Config {
            max_retries: 3,
            retry_backoff: Duration::ZERO,
            hang_timeout: Duration::ZERO,
            ..Config::default()
        }
    }

    fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn flaky(failures: u32, calls: Arc<AtomicU32>) -> impl Workload {
        WorkloadFn::new("flaky", move |_ctx: CancellationToken| {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < failures {
                    Err(WorkloadError::fail(format!("boom #{n}")))
                } else {
                    Ok(())
                }
            }
        })
    }

    #[tokio::test]
    async fn test_failures_then_success_within_budget() {
        for failures in 0..=3 {
            let mut h = harness(base_cfg());
            let calls = Arc::new(AtomicU32::new(0));
            let token = CancellationToken::new();

            let res = h.regent.supervise(&token, &flaky(failures, Arc::clone(&calls))).await;

            assert!(res.is_ok(), "failures={failures}: {res:?}");
            assert_eq!(calls.load(Ordering::SeqCst), failures + 1);

            let st = h.store.load().unwrap().unwrap();
            assert!(st.passed);
            assert!(st.finished_at.is_some());
            assert_eq!(st.consecutive_errors, 0);

            let events = drain(&mut h.rx);
            let starts = events
                .iter()
                .filter(|e| e.kind == EventKind::AttemptStarting)
                .count();
            assert_eq!(starts as u32, failures + 1);
        }
    }

    #[tokio::test]
    async fn test_exhausted_retries_persist_failure() {
        let mut h = harness(Config {
            max_retries: 2,
            ..base_cfg()
        });
        let calls = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();

        let err = h
            .regent
            .supervise(&token, &flaky(u32::MAX, Arc::clone(&calls)))
            .await
            .unwrap_err();

        match &err {
            RegentError::RetriesExhausted { attempts, last } => {
                assert_eq!(*attempts, 3);
                assert_eq!(last.to_string(), "workload failed: boom #2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let st = h.store.load().unwrap().unwrap();
        assert!(!st.passed);
        assert!(st.finished_at.is_some());
        assert_eq!(st.consecutive_errors, 3);

        let events = drain(&mut h.rx);
        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::GaveUp);
        assert_eq!(last.message(), "giving up after 3 attempts: workload failed: boom #2");
        assert_eq!(events[0].message(), "starting attempt 1/3");
    }

    #[tokio::test]
    async fn test_cancel_before_first_attempt() {
        let mut h = harness(base_cfg());
        let calls = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        token.cancel();

        let err = h
            .regent
            .supervise(&token, &flaky(0, Arc::clone(&calls)))
            .await
            .unwrap_err();

        assert!(err.is_canceled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let kinds: Vec<_> = drain(&mut h.rx).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::ShutdownRequested]);
        assert!(!h.regent.state().running());
    }

    #[tokio::test]
    async fn test_cancellation_error_is_not_a_retry() {
        let h = harness(base_cfg());
        let calls = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();

        let workload = {
            let calls = Arc::clone(&calls);
            let token = token.clone();
            WorkloadFn::new("cancel-me", move |_ctx: CancellationToken| {
                let calls = Arc::clone(&calls);
                let token = token.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    token.cancel();
                    Err(WorkloadError::Canceled)
                }
            })
        };

        let err = h.regent.supervise(&token, &workload).await.unwrap_err();
        assert!(err.is_canceled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.regent.state().consecutive_errors, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_returns_promptly() {
        let h = harness(Config {
            retry_backoff: Duration::from_secs(3600),
            ..base_cfg()
        });
        let calls = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_secs(1)).await;
                token.cancel();
            })
        };

        let started = time::Instant::now();
        let err = h
            .regent
            .supervise(&token, &flaky(u32::MAX, Arc::clone(&calls)))
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(err.is_canceled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_is_detected_and_retried() {
        let timeout = Duration::from_millis(400);
        let mut h = harness(Config {
            max_retries: 1,
            hang_timeout: timeout,
            ..base_cfg()
        });
        let calls = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();

        let workload = {
            let calls = Arc::clone(&calls);
            WorkloadFn::new("stuck-once", move |ctx: CancellationToken| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        ctx.cancelled().await;
                        return Err(WorkloadError::Canceled);
                    }
                    Ok(())
                }
            })
        };

        let started = time::Instant::now();
        h.regent.supervise(&token, &workload).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= timeout);
        assert!(started.elapsed() <= timeout + timeout / 4);

        let events = drain(&mut h.rx);
        let hang = events
            .iter()
            .position(|e| e.kind == EventKind::HangDetected)
            .expect("hang event");
        let failed = events
            .iter()
            .position(|e| e.kind == EventKind::AttemptFailed)
            .unwrap();
        assert!(hang < failed);
        assert!(!token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_keeps_watchdog_quiet() {
        let timeout = Duration::from_millis(400);
        let mut h = harness(Config {
            max_retries: 0,
            hang_timeout: timeout,
            ..base_cfg()
        });
        let token = CancellationToken::new();

        let regent = h.regent.clone();
        let workload = WorkloadFn::new("chatty", move |ctx: CancellationToken| {
            let regent = regent.clone();
            async move {
                for _ in 0..50 {
                    if ctx.is_cancelled() {
                        return Err(WorkloadError::Canceled);
                    }
                    regent.notify_output();
                    time::sleep(Duration::from_millis(150)).await;
                }
                Ok(())
            }
        });

        h.regent.supervise(&token, &workload).await.unwrap();
        let events = drain(&mut h.rx);
        assert!(events.iter().all(|e| e.kind != EventKind::HangDetected));
    }

    #[tokio::test]
    async fn test_update_state_merges_workload_progress() {
        let h = harness(base_cfg());
        let token = CancellationToken::new();

        let regent = h.regent.clone();
        let workload = WorkloadFn::new("reporting", move |_ctx: CancellationToken| {
            let regent = regent.clone();
            async move {
                regent.update_state(&LogRecord::iteration_start(5, "build").with_branch("main"));
                regent.update_state(&LogRecord::new(RecordKind::Text).with_message("hi"));
                regent.update_state(&LogRecord::iteration_complete(5, 0.75).with_commit("abc done"));
                Ok(())
            }
        });

        h.regent.supervise(&token, &workload).await.unwrap();

        let st = h.store.load().unwrap().unwrap();
        assert_eq!(st.iteration, 5);
        assert_eq!(st.branch, "main");
        assert_eq!(st.mode, "build");
        assert_eq!(st.total_cost, 0.75);
        assert_eq!(st.last_commit, "abc done");
        assert_eq!(st.pid, std::process::id());
        assert!(st.last_output_at.is_some());
    }

    #[tokio::test]
    async fn test_persistence_failure_is_only_a_note() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let (bus, mut rx) = Bus::channel(64);
        let regent = Regent::builder(base_cfg(), Arc::new(FakeVcs::default()))
            .with_bus(bus)
            .with_state_store(StateStore::new(blocker.join("state.json")))
            .build();

        let calls = Arc::new(AtomicU32::new(0));
        let res = regent
            .supervise(&CancellationToken::new(), &flaky(0, calls))
            .await;

        assert!(res.is_ok());
        let notes: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::Note)
            .collect();
        assert!(!notes.is_empty());
        assert!(notes[0].message().starts_with("state save failed"));
    }
}
