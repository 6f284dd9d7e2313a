//! StateStore - load/save of 00-project-state.json

use crate::models::ProjectState;
use chrono::Utc;
use serde::Deserialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Errors that can occur when reading or writing the state document
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to read state file: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to parse state file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to write state file: {0}")]
    Write(#[source] std::io::Error),

    #[error("State file was modified by another writer (loaded revision {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Parsed state together with the exact text it was parsed from
#[derive(Debug, Clone)]
pub struct LoadedState {
    pub state: ProjectState,
    pub raw: String,
}

/// Only the revision, for the compare step of a save
#[derive(Deserialize)]
struct RevisionProbe {
    #[serde(default)]
    revision: u64,
}

/// Reads and writes the state document as a whole
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

    /// Cheap precondition check for hook adapters
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the state document
    ///
    /// A missing file is `Ok(None)`, never an error. Unparseable content is
    /// `StateError::Parse`.
    pub fn load(&self) -> Result<Option<LoadedState>, StateError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StateError::Read(e)),
        };

        let state = serde_json::from_str(&raw)?;
        Ok(Some(LoadedState { state, raw }))
    }

    /// Overwrite the state document with `state`
    ///
    /// The on-disk revision must still equal `state.revision`; otherwise
    /// another writer saved in between and the call fails with
    /// `StateError::Conflict` without writing. On success the revision is
    /// bumped and `updatedAt` refreshed.
    pub fn save(&self, state: &mut ProjectState) -> Result<(), StateError> {
        if let Some(found) = self.disk_revision()? {
            if found != state.revision {
                return Err(StateError::Conflict {
                    expected: state.revision,
                    found,
                });
            }
        }

        state.revision += 1;
        state.touch(Utc::now());

        let content = serde_json::to_string_pretty(state).map_err(StateError::Serialize)?;
        if let Err(e) = self.write_atomic(&content) {
            state.revision -= 1;
            return Err(e);
        }

        tracing::debug!(path = %self.path.display(), revision = state.revision, "state saved");
        Ok(())
    }

    fn disk_revision(&self) -> Result<Option<u64>, StateError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StateError::Read(e)),
        };

        let probe: RevisionProbe = serde_json::from_str(&raw)?;
        Ok(Some(probe.revision))
    }

    /// Write to a temp file in the same directory, then rename over the target
    fn write_atomic(&self, content: &str) -> Result<(), StateError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| StateError::InvalidPath(self.path.display().to_string()))?;
        std::fs::create_dir_all(parent).map_err(StateError::Write)?;

        let mut temp_file = NamedTempFile::new_in(parent).map_err(StateError::Write)?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(StateError::Write)?;
        temp_file.flush().map_err(StateError::Write)?;
        temp_file
            .persist(&self.path)
            .map_err(|e| StateError::Write(e.error))?;

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhaseStatus;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
  "projectName": "shop",
  "version": "1.0.0",
  "currentPhase": 2,
  "phases": {
    "1": { "status": "completed", "progress": 100 },
    "2": { "status": "in_progress", "progress": 30 }
  },
  "decisions": [],
  "modules": [],
  "customField": [1, 2, 3]
}"#;

    fn setup_store() -> (TempDir, StateStore) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir
            .path()
            .join(".framework-blueprints")
            .join("00-project-state.json");
        (temp_dir, StateStore::new(path))
    }

    fn write_sample(store: &StateStore) {
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), SAMPLE).unwrap();
    }

    #[test]
    fn test_load_absent_is_none() {
        let (_temp, store) = setup_store();

        assert!(!store.exists());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_load_malformed_is_parse_error() {
        let (_temp, store) = setup_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StateError::Parse(_))));
    }

    #[test]
    fn test_load_keeps_raw_text() {
        let (_temp, store) = setup_store();
        write_sample(&store);

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.raw, SAMPLE);
        assert_eq!(loaded.state.project_name(), "shop");
        assert_eq!(
            loaded.state.phase_entry(2).unwrap().status,
            PhaseStatus::InProgress
        );
    }

    #[test]
    fn test_save_and_load() {
        let (_temp, store) = setup_store();
        write_sample(&store);

        let mut state = store.load().unwrap().unwrap().state;
        state.current_phase = Some(3);
        store.save(&mut state).unwrap();

        let reloaded = store.load().unwrap().unwrap().state;
        assert_eq!(reloaded.current_phase, Some(3));
        assert_eq!(reloaded.revision, 1);
        assert!(reloaded.updated_at.is_some());
        assert_eq!(reloaded.extra["customField"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_save_creates_missing_file() {
        let (_temp, store) = setup_store();

        let mut state = ProjectState {
            project_name: Some("fresh".to_string()),
            ..Default::default()
        };
        store.save(&mut state).unwrap();

        assert!(store.exists());
        assert_eq!(store.load().unwrap().unwrap().state.project_name(), "fresh");
    }

    #[test]
    fn test_stale_save_is_rejected() {
        let (_temp, store) = setup_store();
        write_sample(&store);

        let mut first = store.load().unwrap().unwrap().state;
        let mut second = store.load().unwrap().unwrap().state;

        first.version = Some("2.0.0".to_string());
        store.save(&mut first).unwrap();

        second.version = Some("3.0.0".to_string());
        let err = store.save(&mut second).unwrap_err();
        assert!(matches!(err, StateError::Conflict { expected: 0, found: 1 }));
        assert_eq!(second.revision, 0);

        // The first writer's update survives
        let on_disk = store.load().unwrap().unwrap().state;
        assert_eq!(on_disk.version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_sequential_saves_bump_revision() {
        let (_temp, store) = setup_store();
        write_sample(&store);

        let mut state = store.load().unwrap().unwrap().state;
        store.save(&mut state).unwrap();
        store.save(&mut state).unwrap();

        assert_eq!(state.revision, 2);
        assert_eq!(store.load().unwrap().unwrap().state.revision, 2);
    }
}
