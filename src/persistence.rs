//! Durable storage for the persisted timer record
//!
//! The engine loads the record once at construction and saves it back on
//! every externally visible phase change and cycle-counter change, never on
//! plain progress ticks.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use anyhow::{Context, Result};
use tracing::debug;

use crate::state::PersistedTimerState;

/// Storage boundary for [`PersistedTimerState`].
///
/// Implementations decide the durable medium; the engine only requires that
/// a saved record loads back losslessly. Save and load failures are reported
/// to the caller, and the engine treats them as best-effort durability: its
/// in-memory state stays correct either way.
pub trait StateStore: Send + Sync {
    /// Load the last saved record, or the default record if none exists yet.
    fn load(&self) -> Result<PersistedTimerState>;

    /// Replace the saved record.
    fn save(&self, state: &PersistedTimerState) -> Result<()>;
}

/// File-backed store holding the record as pretty-printed JSON.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the file at `path`. The file and its parent
    /// directories are created on the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<PersistedTimerState> {
        if !self.path.exists() {
            debug!("No timer state file at {}, using defaults", self.path.display());
            return Ok(PersistedTimerState::default());
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read timer state from {}", self.path.display()))?;
        let state = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse timer state in {}", self.path.display()))?;
        Ok(state)
    }

    fn save(&self, state: &PersistedTimerState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(state).context("Failed to serialize timer state")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write timer state to {}", self.path.display()))
    }
}

/// In-memory store for hosts that serialize the record through their own
/// persistence layer, and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<PersistedTimerState>,
}

impl MemoryStore {
    /// Create a store holding the default record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with `record`, as if it had been saved by a
    /// previous run.
    pub fn with_record(record: PersistedTimerState) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    /// The most recently saved record.
    pub fn current(&self) -> PersistedTimerState {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<PersistedTimerState> {
        Ok(self.current())
    }

    fn save(&self, state: &PersistedTimerState) -> Result<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = *state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TimerPhase;

    fn sample_record() -> PersistedTimerState {
        PersistedTimerState {
            phase: TimerPhase::Run,
            last_observed_phase: Some(TimerPhase::Run),
            start_time_millis: 1_700_000_123_456,
            completed_cycles: 4,
        }
    }

    #[test]
    fn json_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("pomodoro.json"));

        store.save(&sample_record()).unwrap();
        assert_eq!(store.load().unwrap(), sample_record());
    }

    #[test]
    fn json_store_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load().unwrap(), PersistedTimerState::default());
    }

    #[test]
    fn json_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/dirs/pomodoro.json"));

        store.save(&sample_record()).unwrap();
        assert_eq!(store.load().unwrap(), sample_record());
    }

    #[test]
    fn json_store_surfaces_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pomodoro.json");
        fs::write(&path, "not json at all").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().is_err());
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), PersistedTimerState::default());

        store.save(&sample_record()).unwrap();
        assert_eq!(store.current(), sample_record());
        assert_eq!(store.load().unwrap(), sample_record());
    }
}
