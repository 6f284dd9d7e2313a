//! Phase Model
//!
//! The six fixed workflow phases, their per-phase status, and the canonical
//! name table used for human-readable summaries.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Number of phases in the workflow
pub const PHASE_COUNT: u8 = 6;

/// One of the six fixed workflow phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Discovery,
    Structure,
    Planning,
    Assignment,
    Execution,
    Integration,
}

impl Phase {
    /// All phases in workflow order
    pub const ALL: [Phase; 6] = [
        Phase::Discovery,
        Phase::Structure,
        Phase::Planning,
        Phase::Assignment,
        Phase::Execution,
        Phase::Integration,
    ];

    /// Look up a phase by its 1-based number
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Phase::Discovery),
            2 => Some(Phase::Structure),
            3 => Some(Phase::Planning),
            4 => Some(Phase::Assignment),
            5 => Some(Phase::Execution),
            6 => Some(Phase::Integration),
            _ => None,
        }
    }

    /// 1-based phase number
    pub fn number(&self) -> u8 {
        match self {
            Phase::Discovery => 1,
            Phase::Structure => 2,
            Phase::Planning => 3,
            Phase::Assignment => 4,
            Phase::Execution => 5,
            Phase::Integration => 6,
        }
    }

    /// Canonical display name
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Discovery => "Discovery",
            Phase::Structure => "Structure",
            Phase::Planning => "Planning",
            Phase::Assignment => "Assignment",
            Phase::Execution => "Execution",
            Phase::Integration => "Integration",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display name for a raw phase number; unknown numbers render as "Unknown"
pub fn phase_name(number: i64) -> &'static str {
    u8::try_from(number)
        .ok()
        .and_then(Phase::from_number)
        .map_or("Unknown", |p| p.name())
}

/// Status of a single phase
///
/// Serialized as `pending`, `in_progress` or `completed`. Any other string an
/// external writer puts in the document is kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PhaseStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Other(String),
}

impl PhaseStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Other(s) => s,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PhaseStatus::Completed)
    }

    /// Checkbox glyph used in summaries
    pub fn checkbox(&self) -> &'static str {
        match self {
            PhaseStatus::Completed => "[x]",
            PhaseStatus::InProgress => "[~]",
            _ => "[ ]",
        }
    }
}

impl From<String> for PhaseStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => PhaseStatus::Pending,
            "in_progress" => PhaseStatus::InProgress,
            "completed" => PhaseStatus::Completed,
            _ => PhaseStatus::Other(value),
        }
    }
}

impl From<PhaseStatus> for String {
    fn from(value: PhaseStatus) -> Self {
        match value {
            PhaseStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-phase record stored under `phases` in the state document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEntry {
    #[serde(default)]
    pub status: PhaseStatus,

    /// Percent complete, 0-100 by convention
    ///
    /// Kept as written: other tools store fractions, and a value of the
    /// wrong type is reported by validation rather than rejected on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Value>,
}

impl PhaseEntry {
    /// Progress as a JSON number, if it is one
    pub fn progress_number(&self) -> Option<&Number> {
        match &self.progress {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        }
    }

    /// Numeric progress; absent or non-numeric reads as 0
    pub fn progress_percent(&self) -> f64 {
        self.progress_number()
            .and_then(Number::as_f64)
            .unwrap_or(0.0)
    }

    /// Problem with the recorded progress, if any
    pub fn progress_problem(&self) -> Option<String> {
        match &self.progress {
            None => None,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(p) if (0.0..=100.0).contains(&p) => None,
                _ => Some(format!("progress {} is outside 0-100", n)),
            },
            Some(other) => Some(format!("progress {} is not a number", other)),
        }
    }
}
