//! # Atomic state file.
//!
//! [`StateStore`] persists a [`SupervisorState`] as pretty JSON using
//! write-to-temp, `sync_all`, rename. Readers never observe a half-written file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::snapshot::SupervisorState;

/// Location of the persisted supervisor state.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replaces the state file with `state`.
    pub fn save(&self, state: &SupervisorState) -> io::Result<()> {
        let bytes = serde_json::to_vec_pretty(state).map_err(io::Error::other)?;
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }

        let name = self
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("state");
        let tmp = self
            .path
            .with_file_name(format!(".{name}.tmp.{}", std::process::id()));

        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        if let Some(parent) = parent {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }

    /// Reads the last persisted state; `None` if no run has saved one yet.
    pub fn load(&self) -> io::Result<Option<SupervisorState>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join(".regent").join("state.json"));
        assert_eq!(store.load().unwrap(), None);

        let mut st = SupervisorState::start(99);
        st.branch = "main".into();
        st.total_cost = 1.25;
        st.finish(true);
        store.save(&st).unwrap();

        assert_eq!(store.load().unwrap(), Some(st));
        let leftovers: Vec<_> = fs::read_dir(dir.path().join(".regent"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec!["state.json"]);
    }

    #[test]
    fn test_timestamps_are_rfc3339() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let mut st = SupervisorState::default();
        st.started_at = Some("2026-10-18T09:30:00Z".parse().unwrap());
        store.save(&st).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains(r#""started_at": "2026-10-18T09:30:00Z""#));
        assert!(text.contains(r#""finished_at": null"#));
    }

    #[test]
    fn test_corrupt_file_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        fs::write(store.path(), b"{").unwrap();
        assert_eq!(store.load().unwrap_err().kind(), io::ErrorKind::InvalidData);
    }
}
