//! # Durable, indexed session log.
//!
//! [`DurableLog`] appends every [`LogRecord`] as one JSON line to a per-session
//! file and keeps an in-memory [`IterationIndex`] of completed iterations.
//!
//! ## Architecture
//! ```text
//! append(rec)
//!   └─► lock ─► write line ─► sync_data ─► pos += len ─► index.observe(rec, offset, len) ─► unlock
//!
//! iteration_log(n)
//!   └─► lock ─► range = index[n] ─► unlock
//!         └─► open ─► seek(range.start) ─► read_exact(range.len) ─► split lines ─► parse
//! ```
//!
//! ## Rules
//! - One file per session: `<unix-start>-<pid>.jsonl`. Reopening in the same process
//!   continues at the end of the existing file.
//! - `append` returns only after the bytes are on durable storage.
//! - Writes, the position counter and the index move together under one lock.
//! - Read-back skips unparsable lines with a warning; it never fails on them.
//! - Opening an existing file rebuilds the index by scanning it once.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use jiff::Timestamp;

use super::index::{IterationIndex, IterationRange};
use super::record::LogRecord;
use super::summary::{IterationSummary, SessionSummary};
use crate::error::LogError;

/// File extension of session logs.
pub const LOG_EXTENSION: &str = "jsonl";

static PROCESS_START: OnceLock<i64> = OnceLock::new();

/// Identity of one session: process start time plus process id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId {
    pub started: i64,
    pub pid: u32,
}

impl SessionId {
    /// The session of the running process.
    ///
    /// The start time is captured on first use and stays fixed for the process
    /// lifetime, so every workload restart maps to the same file.
    pub fn current() -> Self {
        let started = *PROCESS_START.get_or_init(|| Timestamp::now().as_second());
        Self {
            started,
            pid: std::process::id(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{self}.{LOG_EXTENSION}")
    }

    pub fn started_at(&self) -> Timestamp {
        Timestamp::from_second(self.started).unwrap_or(Timestamp::UNIX_EPOCH)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.started, self.pid)
    }
}

struct Inner {
    file: File,
    pos: u64,
    index: IterationIndex,
}

/// Append-only session log with an iteration index.
///
/// Owns its file handle exclusively; share it behind an `Arc`.
pub struct DurableLog {
    path: PathBuf,
    session: SessionId,
    inner: Mutex<Inner>,
}

impl DurableLog {
    /// Opens (or creates) the current process's session log inside `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LogError> {
        Self::open_session(dir, SessionId::current())
    }

    /// Opens (or creates) the log of `session` inside `dir`.
    ///
    /// An existing file is scanned once to rebuild the index. A torn final
    /// line (no trailing newline) is terminated so later appends start clean.
    pub fn open_session(dir: impl AsRef<Path>, session: SessionId) -> Result<Self, LogError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| LogError::io(dir, e))?;
        let path = dir.join(session.file_name());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)
            .map_err(|e| LogError::io(&path, e))?;

        let mut index = IterationIndex::default();
        let (mut pos, terminated) = rebuild(&path, &mut index)?;
        if !terminated {
            file.write_all(b"\n")
                .and_then(|()| file.sync_data())
                .map_err(|e| LogError::io(&path, e))?;
            pos += 1;
        }

        Ok(Self {
            path,
            session,
            inner: Mutex::new(Inner { file, pos, index }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Appends `rec` durably and feeds it to the index.
    pub fn append(&self, rec: &LogRecord) -> Result<(), LogError> {
        let mut line = serde_json::to_vec(rec)?;
        line.push(b'\n');
        let len = line.len() as u64;

        let mut inner = self.lock();
        let written = inner
            .file
            .write_all(&line)
            .and_then(|()| inner.file.sync_data());
        if let Err(e) = written {
            // A partial write may have moved the end of file.
            if let Ok(meta) = inner.file.metadata() {
                inner.pos = meta.len();
            }
            return Err(LogError::io(&self.path, e));
        }

        let offset = inner.pos;
        inner.pos += len;
        inner.index.observe(rec, offset, len);
        Ok(())
    }

    /// Completed iterations in completion order (a copy).
    pub fn iterations(&self) -> Vec<IterationSummary> {
        self.lock().index.summaries().to_vec()
    }

    /// Number of the iteration started but not yet completed, if any.
    pub fn pending_iteration(&self) -> Option<u32> {
        self.lock().index.pending_iteration()
    }

    /// Byte range of completed iteration `n` within [`path`](Self::path).
    pub fn iteration_range(&self, n: u32) -> Option<IterationRange> {
        self.lock().index.range(n)
    }

    /// Every record of completed iteration `n`, from its start to its complete record.
    pub fn iteration_log(&self, n: u32) -> Result<Vec<LogRecord>, LogError> {
        let range = self
            .iteration_range(n)
            .ok_or(LogError::IterationNotFound(n))?;

        let mut buf = vec![0u8; range.len() as usize];
        let mut file = File::open(&self.path).map_err(|e| LogError::io(&self.path, e))?;
        file.seek(SeekFrom::Start(range.start))
            .and_then(|_| file.read_exact(&mut buf))
            .map_err(|e| LogError::io(&self.path, e))?;

        Ok(parse_lines(&buf, &self.path))
    }

    /// Aggregate view of the session so far.
    pub fn session_summary(&self) -> SessionSummary {
        let inner = self.lock();
        let summaries = inner.index.summaries();
        SessionSummary {
            session: self.session.to_string(),
            started_at: self.session.started_at(),
            total_cost: summaries.iter().map(|s| s.cost).sum(),
            iterations: summaries.len(),
            branch: inner.index.last_branch().to_string(),
            commit: inner.index.last_commit().to_string(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scans an existing log into `index`.
///
/// Returns the byte length of the file and whether it ends with a newline
/// (an empty file counts as terminated).
fn rebuild(path: &Path, index: &mut IterationIndex) -> Result<(u64, bool), LogError> {
    let file = File::open(path).map_err(|e| LogError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut line = Vec::new();
    let mut pos = 0u64;
    let mut terminated = true;

    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| LogError::io(path, e))?;
        if n == 0 {
            break;
        }
        terminated = line.last() == Some(&b'\n');
        let body = trim_newline(&line);
        if !body.is_empty() {
            match serde_json::from_slice::<LogRecord>(body) {
                Ok(rec) => index.observe(&rec, pos, n as u64),
                Err(err) => {
                    tracing::warn!(path = %path.display(), offset = pos, error = %err, "skipping malformed log line");
                }
            }
        }
        pos += n as u64;
    }
    Ok((pos, terminated))
}

fn parse_lines(buf: &[u8], path: &Path) -> Vec<LogRecord> {
    buf.split(|b| *b == b'\n')
        .map(trim_newline)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_slice::<LogRecord>(line) {
            Ok(rec) => Some(rec),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping malformed log line");
                None
            }
        })
        .collect()
}

fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
