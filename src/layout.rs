//! Fixed on-disk layout of the blueprint artifacts
//!
//! Every path is resolved against a project root. Paths that get recorded in
//! the state document or printed are kept relative to that root.

use std::path::{Path, PathBuf};

/// Directory holding all workflow-managed files
pub const BLUEPRINT_DIR: &str = ".framework-blueprints";
/// State document file name
pub const STATE_FILE: &str = "00-project-state.json";
/// Backup directory name (inside the blueprint directory)
pub const BACKUP_DIR: &str = "backups";
/// Contract artifact, relative to the blueprint directory
pub const CONTRACTS_FILE: &str = "03-api-planning/api-contracts.md";
/// Config file name (inside the blueprint directory)
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at the current working directory
    pub fn from_current_dir() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blueprint_dir(&self) -> PathBuf {
        self.root.join(BLUEPRINT_DIR)
    }

    pub fn state_file(&self) -> PathBuf {
        self.blueprint_dir().join(STATE_FILE)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.blueprint_dir().join(BACKUP_DIR)
    }

    pub fn contracts_file(&self) -> PathBuf {
        self.blueprint_dir().join(CONTRACTS_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.blueprint_dir().join(CONFIG_FILE)
    }

    /// Backup path as recorded in checkpoint records (root-relative, `/`-separated)
    pub fn relative_backup_path(&self, file_name: &str) -> String {
        format!("{}/{}/{}", BLUEPRINT_DIR, BACKUP_DIR, file_name)
    }

    /// Resolve a root-relative path
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

/// Normalize a host-supplied path for substring matching
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
