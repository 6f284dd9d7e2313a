//! Checkpoints - immutable backups of the state document
//!
//! A checkpoint copies the live document byte-for-byte into
//! `.framework-blueprints/backups/`, then appends a record pointing at that
//! copy. The copy never contains its own record.

use super::store::{StateError, StateStore};
use crate::layout::Layout;
use crate::models::{CheckpointRecord, RetentionPolicy};
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

/// Description used when none is given
pub const DEFAULT_DESCRIPTION: &str = "manual";

/// Longest sanitized description kept in a backup file name
const MAX_DESCRIPTION_LEN: usize = 30;

const BACKUP_PREFIX: &str = "state-";
const BACKUP_EXTENSION: &str = ".json";

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("No state file found. Nothing to checkpoint.")]
    NoState,

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Failed to write backup {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a successful checkpoint
#[derive(Debug, Clone)]
pub struct BackupRef {
    pub file_name: String,
    /// Project the checkpoint belongs to, for display
    pub project_name: String,
    pub path: PathBuf,
    pub record: CheckpointRecord,
    /// Older backups removed by the retention policy
    pub evicted: Vec<String>,
}

/// Integrity of the backup a checkpoint record points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupIntegrity {
    Intact,
    Modified,
    Missing,
    /// Record predates digests
    Unverified,
}

pub struct CheckpointManager {
    layout: Layout,
    store: StateStore,
    retention: RetentionPolicy,
}

impl CheckpointManager {
    pub fn new(layout: Layout, retention: RetentionPolicy) -> Self {
        let store = StateStore::new(layout.state_file());
        Self {
            layout,
            store,
            retention,
        }
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.layout.backup_dir()
    }

    /// Create a checkpoint now
    pub fn checkpoint(&self, description: &str) -> Result<BackupRef, CheckpointError> {
        self.checkpoint_at(description, Utc::now())
    }

    /// Create a checkpoint stamped with `now`
    pub fn checkpoint_at(
        &self,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<BackupRef, CheckpointError> {
        let loaded = self.store.load()?.ok_or(CheckpointError::NoState)?;
        let mut state = loaded.state;

        let description = if description.trim().is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            description
        };

        let (file_name, path) =
            self.write_backup(&backup_base_name(now, description), loaded.raw.as_bytes())?;

        let record = CheckpointRecord {
            timestamp: now,
            description: description.to_string(),
            backup: self.layout.relative_backup_path(&file_name),
            phase: state.current_phase,
            progress: state.current_progress_number(),
            digest: Some(calculate_checksum(loaded.raw.as_bytes())),
        };
        state.checkpoints.push(record.clone());

        if let Err(e) = self.store.save(&mut state) {
            // No record points at the backup; don't leave it behind
            if let Err(remove_err) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %remove_err, "failed to remove orphaned backup");
            }
            return Err(e.into());
        }

        let evicted = self.apply_retention(&file_name, now);
        tracing::info!(backup = %file_name, evicted = evicted.len(), "checkpoint created");

        Ok(BackupRef {
            file_name,
            project_name: state.project_name().to_string(),
            path,
            record,
            evicted,
        })
    }

    /// Write `content` to a new backup file, never replacing an existing one
    fn write_backup(&self, base: &str, content: &[u8]) -> Result<(String, PathBuf), CheckpointError> {
        let dir = self.backup_dir();
        std::fs::create_dir_all(&dir).map_err(|source| CheckpointError::Backup {
            path: dir.clone(),
            source,
        })?;

        let mut attempt = 0u32;
        loop {
            let file_name = if attempt == 0 {
                format!("{}{}", base, BACKUP_EXTENSION)
            } else {
                format!("{}-{}{}", base, attempt, BACKUP_EXTENSION)
            };
            let path = dir.join(&file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(content)
                        .and_then(|_| file.flush())
                        .map_err(|source| CheckpointError::Backup {
                            path: path.clone(),
                            source,
                        })?;
                    return Ok((file_name, path));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(source) => return Err(CheckpointError::Backup { path, source }),
            }
        }
    }

    /// Backup file names, oldest first
    pub fn list_backups(&self) -> std::io::Result<Vec<String>> {
        let dir = self.backup_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_EXTENSION) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Delete backups the retention policy no longer allows; `keep` is never removed
    fn apply_retention(&self, keep: &str, now: DateTime<Utc>) -> Vec<String> {
        if self.retention.is_unbounded() {
            return Vec::new();
        }

        let others: Vec<String> = match self.list_backups() {
            Ok(names) => names.into_iter().filter(|n| n != keep).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to list backups for retention");
                return Vec::new();
            }
        };

        let mut doomed = BTreeSet::new();

        if let Some(max_count) = self.retention.max_count {
            let excess = (others.len() + 1).saturating_sub(max_count.max(1));
            doomed.extend(others.iter().take(excess).cloned());
        }

        // A cutoff before the representable range means nothing is old enough
        let cutoff = self
            .retention
            .max_age_days
            .and_then(|days| now.checked_sub_signed(Duration::try_days(i64::from(days))?));
        if let Some(cutoff) = cutoff {
            doomed.extend(
                others
                    .iter()
                    .filter(|n| backup_timestamp(n).is_some_and(|ts| ts < cutoff))
                    .cloned(),
            );
        }

        let dir = self.backup_dir();
        doomed
            .into_iter()
            .filter(|name| match std::fs::remove_file(dir.join(name)) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(backup = %name, error = %e, "failed to evict backup");
                    false
                }
            })
            .collect()
    }

    /// Check that a record's backup still holds the bytes it was written with
    pub fn verify(&self, record: &CheckpointRecord) -> BackupIntegrity {
        let content = match std::fs::read(self.layout.resolve(&record.backup)) {
            Ok(content) => content,
            Err(_) => return BackupIntegrity::Missing,
        };

        match &record.digest {
            None => BackupIntegrity::Unverified,
            Some(digest) if *digest == calculate_checksum(&content) => BackupIntegrity::Intact,
            Some(_) => BackupIntegrity::Modified,
        }
    }
}

/// `state-<timestamp>-<description>` without extension
pub fn backup_base_name(now: DateTime<Utc>, description: &str) -> String {
    let timestamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!(
        "{}{}-{}",
        BACKUP_PREFIX,
        timestamp,
        sanitize_description(description)
    )
}

/// Make a free-text description safe for a file name
///
/// Runs of characters other than ASCII alphanumerics, `-` and `_` become a
/// single `-`; the result is truncated to 30 characters.
pub fn sanitize_description(description: &str) -> String {
    let mut out = String::new();
    let mut pending_separator = false;

    for c in description.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    let truncated: String = out
        .trim_start_matches('-')
        .chars()
        .take(MAX_DESCRIPTION_LEN)
        .collect();
    let trimmed = truncated.trim_end_matches('-');
    if trimmed.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Timestamp encoded in a backup file name (second precision)
fn backup_timestamp(file_name: &str) -> Option<DateTime<Utc>> {
    let stamp = file_name.strip_prefix(BACKUP_PREFIX)?.get(..19)?;
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H-%M-%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// `sha256:<hex>` of raw bytes
pub fn calculate_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("sha256:{:x}", hasher.finalize())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
  "projectName": "shop",
  "version": "1.0.0",
  "currentPhase": 3,
  "phases": {
    "1": { "status": "completed", "progress": 100 },
    "2": { "status": "completed", "progress": 100 },
    "3": { "status": "in_progress", "progress": 45 }
  },
  "decisions": [],
  "modules": []
}"#;

    fn setup_project() -> (TempDir, Layout) {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path());
        std::fs::create_dir_all(layout.blueprint_dir()).unwrap();
        std::fs::write(layout.state_file(), SAMPLE).unwrap();
        (temp_dir, layout)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_no_state_means_no_writes() {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path());
        let manager = CheckpointManager::new(layout.clone(), RetentionPolicy::default());

        let err = manager.checkpoint("first").unwrap_err();
        assert!(matches!(err, CheckpointError::NoState));
        assert!(!layout.backup_dir().exists());
        assert!(!layout.state_file().exists());
    }

    #[test]
    fn test_backup_is_pre_checkpoint_document() {
        let (_temp, layout) = setup_project();
        let manager = CheckpointManager::new(layout.clone(), RetentionPolicy::default());

        let backup = manager.checkpoint_at("before refactor", at(0)).unwrap();

        let copied = std::fs::read_to_string(&backup.path).unwrap();
        assert_eq!(copied, SAMPLE);
        assert!(!copied.contains("checkpoints"));

        assert_eq!(backup.record.phase, Some(3));
        assert_eq!(backup.record.progress, serde_json::Number::from(45));
        assert_eq!(backup.project_name, "shop");
        assert_eq!(backup.record.description, "before refactor");
        assert_eq!(
            backup.record.backup,
            format!(".framework-blueprints/backups/{}", backup.file_name)
        );

        let state = StateStore::new(layout.state_file()).load().unwrap().unwrap().state;
        assert_eq!(state.checkpoints, vec![backup.record.clone()]);
        assert_eq!(state.revision, 1);
    }

    #[test]
    fn test_two_checkpoints_two_backups_in_order() {
        let (_temp, layout) = setup_project();
        let manager = CheckpointManager::new(layout.clone(), RetentionPolicy::default());

        let first = manager.checkpoint_at("same", at(0)).unwrap();
        let second = manager.checkpoint_at("same", at(0)).unwrap();

        assert_ne!(first.file_name, second.file_name);
        assert_eq!(manager.list_backups().unwrap().len(), 2);

        let state = StateStore::new(layout.state_file()).load().unwrap().unwrap().state;
        assert_eq!(state.checkpoints.len(), 2);
        assert_eq!(state.checkpoints[0].backup, first.record.backup);
        assert_eq!(state.checkpoints[1].backup, second.record.backup);

        // The second backup already contains the first record, not its own
        let second_copy = std::fs::read_to_string(&second.path).unwrap();
        assert!(second_copy.contains(&first.file_name));
        assert!(!second_copy.contains(&second.file_name));
    }

    #[test]
    fn test_backup_name_format() {
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(
            backup_base_name(now, "phase 2 done"),
            "state-2024-05-06T07-08-09-000Z-phase-2-done"
        );
    }

    #[test]
    fn test_sanitize_description() {
        assert_eq!(sanitize_description("phase 2   done"), "phase-2-done");
        assert_eq!(sanitize_description("../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_description("--pre_release--"), "pre_release");
        assert_eq!(sanitize_description("  !!  "), "manual");
        assert_eq!(sanitize_description(""), "manual");
        assert_eq!(
            sanitize_description("a very long description that keeps going on"),
            "a-very-long-description-that-k"
        );
        assert_eq!(sanitize_description("abcdefghijklmnopqrstuvwxyz abc d"), "abcdefghijklmnopqrstuvwxyz-abc");
    }

    #[test]
    fn test_empty_description_defaults_to_manual() {
        let (_temp, layout) = setup_project();
        let manager = CheckpointManager::new(layout, RetentionPolicy::default());

        let backup = manager.checkpoint_at("", at(0)).unwrap();
        assert_eq!(backup.record.description, "manual");
        assert!(backup.file_name.ends_with("-manual.json"));
    }

    #[test]
    fn test_retention_by_count() {
        let (_temp, layout) = setup_project();
        let policy = RetentionPolicy {
            max_count: Some(2),
            max_age_days: None,
        };
        let manager = CheckpointManager::new(layout.clone(), policy);

        let first = manager.checkpoint_at("one", at(0)).unwrap();
        manager.checkpoint_at("two", at(60)).unwrap();
        let third = manager.checkpoint_at("three", at(120)).unwrap();

        assert_eq!(third.evicted, vec![first.file_name.clone()]);
        let remaining = manager.list_backups().unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(!remaining.contains(&first.file_name));

        // Records stay append-only even when backups are evicted
        let state = StateStore::new(layout.state_file()).load().unwrap().unwrap().state;
        assert_eq!(state.checkpoints.len(), 3);
        assert_eq!(manager.verify(&state.checkpoints[0]), BackupIntegrity::Missing);
        assert_eq!(manager.verify(&state.checkpoints[2]), BackupIntegrity::Intact);
    }

    #[test]
    fn test_retention_by_age() {
        let (_temp, layout) = setup_project();
        std::fs::create_dir_all(layout.backup_dir()).unwrap();
        let stale = "state-2020-01-01T00-00-00-000Z-old.json";
        std::fs::write(layout.backup_dir().join(stale), "{}").unwrap();

        let policy = RetentionPolicy {
            max_count: None,
            max_age_days: Some(30),
        };
        let manager = CheckpointManager::new(layout, policy);
        let backup = manager.checkpoint_at("fresh", at(0)).unwrap();

        assert_eq!(backup.evicted, vec![stale.to_string()]);
        assert_eq!(manager.list_backups().unwrap(), vec![backup.file_name]);
    }

    #[test]
    fn test_huge_max_age_evicts_nothing() {
        let (_temp, layout) = setup_project();
        std::fs::create_dir_all(layout.backup_dir()).unwrap();
        let ancient = "state-1970-01-01T00-00-00-000Z-old.json";
        std::fs::write(layout.backup_dir().join(ancient), "{}").unwrap();

        let policy = RetentionPolicy {
            max_count: None,
            max_age_days: Some(u32::MAX),
        };
        let manager = CheckpointManager::new(layout.clone(), policy);
        let backup = manager.checkpoint_at("x", at(0)).unwrap();

        assert!(backup.evicted.is_empty());
        assert_eq!(manager.list_backups().unwrap().len(), 2);
        let state = StateStore::new(layout.state_file()).load().unwrap().unwrap().state;
        assert_eq!(state.checkpoints.len(), 1);
    }

    #[test]
    fn test_fractional_progress_is_recorded_as_written() {
        let (_temp, layout) = setup_project();
        std::fs::write(
            layout.state_file(),
            r#"{"currentPhase": 2, "phases": {"2": {"progress": 12.5}}, "decisions": [{"id": 7}]}"#,
        )
        .unwrap();
        let manager = CheckpointManager::new(layout, RetentionPolicy::default());

        let backup = manager.checkpoint_at("frac", at(0)).unwrap();
        assert_eq!(backup.record.progress.to_string(), "12.5");
        assert_eq!(backup.record.phase, Some(2));
        assert_eq!(backup.project_name, "unnamed");
    }

    #[test]
    fn test_verify_detects_modification() {
        let (_temp, layout) = setup_project();
        let manager = CheckpointManager::new(layout, RetentionPolicy::default());

        let backup = manager.checkpoint_at("check", at(0)).unwrap();
        assert_eq!(manager.verify(&backup.record), BackupIntegrity::Intact);

        std::fs::write(&backup.path, "tampered").unwrap();
        assert_eq!(manager.verify(&backup.record), BackupIntegrity::Modified);

        let mut legacy = backup.record.clone();
        legacy.digest = None;
        assert_eq!(manager.verify(&legacy), BackupIntegrity::Unverified);
    }

    #[test]
    fn test_checksum_format() {
        assert_eq!(
            calculate_checksum(b"abc"),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
