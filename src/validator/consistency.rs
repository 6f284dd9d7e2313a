//! State Consistency Validator
//!
//! Audits the state document:
//! - Required top-level fields are present
//! - Every phase before the cursor is completed
//! - Every decision names a source
//! - Cursor and progress values are in range

use crate::layout::Layout;
use crate::models::{
    Finding, FindingCategory, FindingLevel, PassKind, PassReport, ProjectState, PHASE_COUNT,
};
use crate::state::StateStore;

/// Validator for 00-project-state.json
pub struct ConsistencyValidator {
    store: StateStore,
}

impl ConsistencyValidator {
    pub fn new(layout: &Layout) -> Self {
        Self {
            store: StateStore::new(layout.state_file()),
        }
    }

    /// Run the state pass
    ///
    /// Skips when there is no state document. An unreadable document is a
    /// single failing issue rather than an abort, so other passes still run.
    pub fn validate(&self) -> PassReport {
        match self.store.load() {
            Ok(None) => PassReport::skipped(PassKind::State, "No state file found"),
            Ok(Some(loaded)) => {
                PassReport::from_findings(PassKind::State, check_state(&loaded.state))
            }
            Err(e) => PassReport::from_findings(
                PassKind::State,
                vec![Finding::new(
                    FindingLevel::Fail,
                    FindingCategory::UnreadableDocument,
                    format!("State file is unreadable: {}", e),
                )
                .in_file(self.store.path())],
            ),
        }
    }
}

/// All findings for a parsed state document, one issue each
pub fn check_state(state: &ProjectState) -> Vec<Finding> {
    let mut findings = Vec::new();

    for field in state.missing_required_fields() {
        findings.push(Finding::new(
            FindingLevel::Fail,
            FindingCategory::MissingField,
            format!("Missing required field: {}", field),
        ));
    }

    if let Some(current) = state.current_phase {
        if !state.current_phase_in_range() {
            findings.push(Finding::new(
                FindingLevel::Fail,
                FindingCategory::PhaseOutOfRange,
                format!("currentPhase {} is outside 1-{}", current, PHASE_COUNT),
            ));
        }

        for phase in state.inconsistent_phases() {
            findings.push(Finding::new(
                FindingLevel::Warn,
                FindingCategory::PhaseInconsistency,
                format!("Phase {} should be completed (current is {})", phase, current),
            ));
        }
    }

    for (key, entry) in state.phases.iter().flatten() {
        if let Some(problem) = entry.progress_problem() {
            findings.push(Finding::new(
                FindingLevel::Warn,
                FindingCategory::ProgressOutOfRange,
                format!("Phase {} {}", key, problem),
            ));
        }
    }

    for index in state.decisions_missing_source() {
        findings.push(Finding::new(
            FindingLevel::Warn,
            FindingCategory::MissingSource,
            format!("Decision {} missing source URL", index),
        ));
    }

    findings
}

// =============================================================================
// Tests
// =============================================================================
