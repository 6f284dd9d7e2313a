use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// fwdev configuration, loaded from `.framework-blueprints/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FwdevConfig {
    #[serde(default)]
    pub backups: RetentionPolicy,

    #[serde(default)]
    pub hooks: HookConfig,

    #[serde(default)]
    pub links: LinkConfig,
}

impl FwdevConfig {
    /// Load config from the given path; a missing file yields the defaults
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load config for a hook adapter: problems are logged and defaults used
    pub fn load_or_default(config_path: &Path) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            tracing::warn!(path = %config_path.display(), error = %e, "ignoring unreadable config");
            Self::default()
        })
    }
}

/// Backup retention; both limits unset means backups are kept forever
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Keep at most this many backups
    #[serde(default)]
    pub max_count: Option<usize>,

    /// Evict backups older than this many days
    #[serde(default)]
    pub max_age_days: Option<u32>,
}

impl RetentionPolicy {
    pub fn is_unbounded(&self) -> bool {
        self.max_count.is_none() && self.max_age_days.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    /// How long an adapter waits for its event payload
    #[serde(default = "default_payload_timeout_ms")]
    pub payload_timeout_ms: u64,

    /// Upper bound on payload bytes read
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,
}

fn default_payload_timeout_ms() -> u64 {
    3000
}

fn default_max_payload_bytes() -> u64 {
    1024 * 1024
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            payload_timeout_ms: default_payload_timeout_ms(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

impl HookConfig {
    pub fn payload_timeout(&self) -> Duration {
        Duration::from_millis(self.payload_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Only references starting with this prefix are checked
    #[serde(default = "default_source_prefix")]
    pub source_prefix: String,

    /// Extensions a backtick-quoted reference must end with
    #[serde(default = "default_reference_extensions")]
    pub extensions: Vec<String>,

    /// Extensions of the documents that get scanned
    #[serde(default = "default_document_extensions")]
    pub document_extensions: Vec<String>,

    /// Maximum directory depth below the blueprint directory
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_source_prefix() -> String {
    "src/".to_string()
}

fn default_reference_extensions() -> Vec<String> {
    ["ts", "js", "tsx", "jsx", "md", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_document_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

fn default_max_depth() -> usize {
    32
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            source_prefix: default_source_prefix(),
            extensions: default_reference_extensions(),
            document_extensions: default_document_extensions(),
            max_depth: default_max_depth(),
        }
    }
}
