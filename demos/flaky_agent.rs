//! # Demo: flaky_agent
//!
//! Supervises a fake agent loop that fails twice before completing one
//! iteration. Supervisor events are relayed to the session log as notes and
//! printed at the end together with the persisted state.
//!
//! ## Flow
//! ```text
//! supervise()
//!   ├─► attempt 1 → iteration_start(1) → Err("model overloaded")
//!   ├─► BackoffScheduled{200ms}
//!   ├─► attempt 2 → Err("model overloaded")
//!   ├─► BackoffScheduled{200ms}
//!   └─► attempt 3 → iteration_start(1) ... iteration_complete(1) → Ok
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example flaky_agent
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use regent::{
    Bus, Config, DurableLog, LogRecord, LogWriter, NoteRecorder, RecordKind, Regent, StateStore,
    Subscribe, SubscriberSet, VcsError, VersionControl, WorkloadError, WorkloadFn, enforce_retention,
};
use tokio_util::sync::CancellationToken;

/// Version control that never has anything to revert.
struct Detached;

#[async_trait]
impl VersionControl for Detached {
    async fn current_branch(&self) -> Result<String, VcsError> {
        Ok("main".into())
    }
    async fn last_commit(&self) -> Result<String, VcsError> {
        Ok("0000000 initial".into())
    }
    async fn revert(&self, _id: &str) -> Result<(), VcsError> {
        Ok(())
    }
    async fn push(&self, _branch: &str) -> Result<(), VcsError> {
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let cfg = Config {
        max_retries: 3,
        retry_backoff: Duration::from_millis(200),
        hang_timeout: Duration::from_secs(5),
        work_dir: dir.path().to_path_buf(),
        ..Config::default()
    };

    let log = Arc::new(DurableLog::open(cfg.logs_dir())?);
    let removed = enforce_retention(cfg.logs_dir(), cfg.log_retention)?;
    println!("session {} ({removed} old logs removed)", log.session());

    let (bus, rx) = Bus::channel(cfg.bus_capacity_clamped());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter), Arc::new(NoteRecorder::new(Arc::clone(&log)))];
    let relay = tokio::spawn(SubscriberSet::new(subs).listen(rx));

    let regent = Regent::builder(cfg.clone(), Arc::new(Detached)).with_bus(bus).build();

    let calls = Arc::new(AtomicU32::new(0));
    let agent = {
        let regent = regent.clone();
        let log = Arc::clone(&log);
        WorkloadFn::new("agent", move |ctx: CancellationToken| {
            let regent = regent.clone();
            let log = Arc::clone(&log);
            let calls = Arc::clone(&calls);
            async move {
                let emit = |rec: LogRecord| -> Result<(), WorkloadError> {
                    log.append(&rec).map_err(|e| WorkloadError::fail(e.to_string()))?;
                    regent.update_state(&rec);
                    Ok(())
                };

                emit(LogRecord::iteration_start(1, "build").with_branch("main"))?;
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    emit(LogRecord::new(RecordKind::Error).with_message("model overloaded"))?;
                    return Err(WorkloadError::fail("model overloaded"));
                }
                if ctx.is_cancelled() {
                    return Err(WorkloadError::Canceled);
                }
                emit(LogRecord::new(RecordKind::ToolUse).with_tool("Edit", "src/lib.rs"))?;
                emit(
                    LogRecord::iteration_complete(1, 0.42)
                        .with_duration_ms(1_250)
                        .with_commit("1a2b3c4 add parser"),
                )
            }
        })
    };

    regent.supervise(&CancellationToken::new(), &agent).await?;

    // Dropping the last bus clones lets the relay drain and stop.
    drop(agent);
    drop(regent);
    relay.await?;

    for rec in log.iteration_log(1)? {
        println!("  {:?} {}", rec.kind, rec.message);
    }
    let summary = log.session_summary();
    println!("iterations={} cost={:.2} branch={}", summary.iterations, summary.total_cost, summary.branch);

    if let Some(state) = StateStore::new(cfg.state_path()).load()? {
        println!("state: passed={} iteration={} commit={}", state.passed, state.iteration, state.last_commit);
    }
    Ok(())
}
