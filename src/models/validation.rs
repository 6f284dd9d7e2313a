use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which validation passes to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    State,
    Contracts,
    Links,
    #[default]
    All,
}

impl ValidationMode {
    /// Passes selected by this mode, in execution order
    pub fn passes(&self) -> Vec<PassKind> {
        match self {
            ValidationMode::State => vec![PassKind::State],
            ValidationMode::Contracts => vec![PassKind::Contracts],
            ValidationMode::Links => vec![PassKind::Links],
            ValidationMode::All => vec![PassKind::State, PassKind::Contracts, PassKind::Links],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValidationMode::State => "state",
            ValidationMode::Contracts => "contracts",
            ValidationMode::Links => "links",
            ValidationMode::All => "all",
        }
    }
}

/// One of the three independent validation passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassKind {
    State,
    Contracts,
    Links,
}

impl PassKind {
    /// Section title used in reports
    pub fn title(&self) -> &'static str {
        match self {
            PassKind::State => "State Validation",
            PassKind::Contracts => "Contract Validation",
            PassKind::Links => "Link Validation",
        }
    }
}

/// Outcome of a single pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassStatus {
    Pass,
    Fail,
    Skip,
}

impl PassStatus {
    pub fn name(&self) -> &'static str {
        match self {
            PassStatus::Pass => "PASS",
            PassStatus::Fail => "FAIL",
            PassStatus::Skip => "SKIP",
        }
    }
}

/// How a finding is labelled in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingLevel {
    /// Structural problem (missing field, unreadable document)
    Fail,
    /// Consistency problem (phase regression, missing source, duplicate, dangling link)
    Warn,
}

impl FindingLevel {
    pub fn name(&self) -> &'static str {
        match self {
            FindingLevel::Fail => "FAIL",
            FindingLevel::Warn => "WARN",
        }
    }
}

/// Category of finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    UnreadableDocument,
    MissingField,
    PhaseOutOfRange,
    PhaseInconsistency,
    ProgressOutOfRange,
    MissingSource,
    DuplicatePath,
    BrokenReference,
}

/// A single reported issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub level: FindingLevel,
    pub category: FindingCategory,
    pub message: String,
    /// Document the finding was raised against, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Finding {
    pub fn new(level: FindingLevel, category: FindingCategory, message: impl Into<String>) -> Self {
        Self {
            level,
            category,
            message: message.into(),
            file: None,
        }
    }

    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Format finding for display
    pub fn format(&self) -> String {
        format!("{}: {}", self.level.name(), self.message)
    }
}

/// Result of one pass
///
/// `issues` is counted separately from `findings` because some passes report
/// a single issue with several details (duplicate contract paths).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub kind: PassKind,
    pub status: PassStatus,
    pub issues: usize,
    pub findings: Vec<Finding>,
    /// Informational lines (e.g. endpoint count)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Why the pass was skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl PassReport {
    pub fn skipped(kind: PassKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            status: PassStatus::Skip,
            issues: 0,
            findings: Vec::new(),
            notes: Vec::new(),
            skip_reason: Some(reason.into()),
        }
    }

    /// Build a report where every finding counts as one issue
    pub fn from_findings(kind: PassKind, findings: Vec<Finding>) -> Self {
        let issues = findings.len();
        Self::with_issues(kind, issues, findings)
    }

    pub fn with_issues(kind: PassKind, issues: usize, findings: Vec<Finding>) -> Self {
        Self {
            kind,
            status: if issues == 0 { PassStatus::Pass } else { PassStatus::Fail },
            issues,
            findings,
            notes: Vec::new(),
            skip_reason: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Aggregate over all passes that ran
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passes: Vec<PassReport>,
}

impl ValidationReport {
    pub fn total_issues(&self) -> usize {
        self.passes.iter().map(|p| p.issues).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_issues() == 0
    }

    pub fn pass(&self, kind: PassKind) -> Option<&PassReport> {
        self.passes.iter().find(|p| p.kind == kind)
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for PassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
