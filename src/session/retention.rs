//! Session log retention.
//!
//! Session file names start with the unix start time, so a lexical sort of the
//! names is a chronological sort of the sessions.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::log::LOG_EXTENSION;

/// Lists session logs in `dir`, oldest first.
///
/// A missing directory yields an empty list.
pub fn list_sessions(dir: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir.as_ref()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let is_log = path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION);
        if is_log && entry.file_type()?.is_file() {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Deletes the oldest session logs in `dir` so that at most `max_keep` remain.
///
/// `max_keep == 0` keeps everything. Returns the number of files removed.
pub fn enforce_retention(dir: impl AsRef<Path>, max_keep: usize) -> io::Result<usize> {
    if max_keep == 0 {
        return Ok(0);
    }
    let sessions = list_sessions(dir)?;
    let excess = sessions.len().saturating_sub(max_keep);

    for path in &sessions[..excess] {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed old session log"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(excess)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_keeps_newest_sessions() {
        let dir = tempfile::tempdir().unwrap();
        for started in [1_700_000_005, 1_700_000_001, 1_700_000_003, 1_700_000_002, 1_700_000_004] {
            touch(dir.path(), &format!("{started}-100.jsonl"));
        }
        touch(dir.path(), "notes.txt");

        let removed = enforce_retention(dir.path(), 2).unwrap();
        assert_eq!(removed, 3);

        let left: Vec<_> = list_sessions(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(left, vec!["1700000004-100.jsonl", "1700000005-100.jsonl"]);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_zero_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "1-1.jsonl");
        touch(dir.path(), "2-1.jsonl");
        assert_eq!(enforce_retention(dir.path(), 0).unwrap(), 0);
        assert_eq!(list_sessions(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_directory_is_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("logs");
        assert_eq!(enforce_retention(&missing, 3).unwrap(), 0);
    }
}
