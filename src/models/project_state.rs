//! ProjectState - the persisted workflow state document
//!
//! Mirrors `.framework-blueprints/00-project-state.json`. Every field another
//! tool may leave out is modelled as optional, with the documented default
//! exposed through an accessor instead of being filled in at each read site.
//! Keys fwdev does not know about are carried through `extra` so a full
//! overwrite never drops another writer's content.

use super::phase::{PhaseEntry, PHASE_COUNT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Top-level fields the state validation pass requires
pub const REQUIRED_FIELDS: &[&str] = &[
    "projectName",
    "version",
    "currentPhase",
    "phases",
    "decisions",
    "modules",
];

/// Name shown when `projectName` is absent
pub const UNNAMED_PROJECT: &str = "unnamed";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Workflow cursor, 1-6; any integer loads so range problems can be reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<i64>,

    /// Phase number (as a string key, "1".."6") to status/progress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<BTreeMap<String, PhaseEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decisions: Option<Vec<Decision>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<ModuleEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_details: Option<CriticalDetails>,

    /// Append-only checkpoint history
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checkpoints: Vec<CheckpointRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Write counter used for compare-and-swap on save
    #[serde(default)]
    pub revision: u64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectState {
    /// Project name, or "unnamed"
    pub fn project_name(&self) -> &str {
        self.project_name.as_deref().unwrap_or(UNNAMED_PROJECT)
    }

    pub fn phase_entry(&self, number: i64) -> Option<&PhaseEntry> {
        self.phases.as_ref()?.get(&number.to_string())
    }

    fn current_entry(&self) -> Option<&PhaseEntry> {
        self.current_phase.and_then(|n| self.phase_entry(n))
    }

    /// Progress of the current phase, 0 when unknown
    pub fn current_progress(&self) -> f64 {
        self.current_entry().map_or(0.0, PhaseEntry::progress_percent)
    }

    /// Progress of the current phase exactly as recorded, 0 when not a number
    pub fn current_progress_number(&self) -> Number {
        self.current_entry()
            .and_then(PhaseEntry::progress_number)
            .cloned()
            .unwrap_or_else(|| Number::from(0))
    }

    pub fn decisions(&self) -> &[Decision] {
        self.decisions.as_deref().unwrap_or_default()
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        self.modules.as_deref().unwrap_or_default()
    }

    /// Required top-level fields that are absent from the document
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let present = [
            self.project_name.is_some(),
            self.version.is_some(),
            self.current_phase.is_some(),
            self.phases.is_some(),
            self.decisions.is_some(),
            self.modules.is_some(),
        ];

        REQUIRED_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(field, _)| *field)
            .collect()
    }

    /// Phases before the cursor that have an entry but are not completed
    ///
    /// Phases without an entry are not reported; only recorded regressions are.
    pub fn inconsistent_phases(&self) -> Vec<i64> {
        let Some(current) = self.current_phase else {
            return Vec::new();
        };

        (1..current.min(i64::from(PHASE_COUNT) + 1))
            .filter(|n| {
                self.phase_entry(*n)
                    .is_some_and(|entry| !entry.status.is_completed())
            })
            .collect()
    }

    /// Whether the cursor lies within 1..=6
    pub fn current_phase_in_range(&self) -> bool {
        self.current_phase
            .map_or(true, |n| (1..=i64::from(PHASE_COUNT)).contains(&n))
    }

    /// Indices of decisions without a non-empty `source`
    pub fn decisions_missing_source(&self) -> Vec<usize> {
        self.decisions()
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.has_source())
            .map(|(i, _)| i)
            .collect()
    }

    /// Refresh `updatedAt`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

/// A recorded design decision
///
/// Other tools write these freely (numeric ids are common), so the fields
/// are kept as raw JSON and only rendered for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<Value>,

    /// Where the decision came from (usually a URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Decision {
    /// Display id, or "?"
    pub fn id_label(&self) -> String {
        display_text(self.id.as_ref()).unwrap_or_else(|| "?".to_string())
    }

    /// One-line description: topic, else choice
    pub fn label(&self) -> String {
        display_text(self.topic.as_ref())
            .or_else(|| display_text(self.choice.as_ref()))
            .unwrap_or_else(|| "(no description)".to_string())
    }

    /// Whether a non-empty source is recorded
    pub fn has_source(&self) -> bool {
        display_text(self.source.as_ref()).is_some_and(|s| !s.trim().is_empty())
    }
}

/// Render a loosely typed field; null, false, zero and "" count as unset
fn display_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// A module entry; older documents list bare names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleEntry {
    Named(String),
    Detailed(ModuleRecord),
    /// Anything else another tool put in the list, kept verbatim
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModuleEntry {
    pub fn name(&self) -> String {
        match self {
            ModuleEntry::Named(name) => name.clone(),
            ModuleEntry::Detailed(record) => record.name.clone().unwrap_or_else(|| "?".to_string()),
            ModuleEntry::Other(value) => value.to_string(),
        }
    }

    /// Module status, "defined" when not recorded
    pub fn status(&self) -> &str {
        match self {
            ModuleEntry::Detailed(record) => record.status.as_deref().unwrap_or("defined"),
            _ => "defined",
        }
    }
}

/// Details that are easy to lose between sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalDetails {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_vars: Vec<Value>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub non_standard_paths: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_quirks: Vec<Value>,
}

/// One entry of the append-only `checkpoints` history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub timestamp: DateTime<Utc>,

    /// Description exactly as given by the caller
    pub description: String,

    /// Backup location relative to the project root
    pub backup: String,

    /// `currentPhase` at checkpoint time
    #[serde(default)]
    pub phase: Option<i64>,

    /// Progress of that phase at checkpoint time
    #[serde(default = "zero_progress")]
    pub progress: Number,

    /// `sha256:` checksum of the backup bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

fn zero_progress() -> Number {
    Number::from(0)
}
