use crate::layout::Layout;
use crate::models::{phase_name, FwdevConfig, Phase, ProjectState};
use crate::state::{BackupIntegrity, CheckpointManager, StateStore};
use crate::Result;
use anyhow::Context;
use colored::Colorize;

/// Number of most recent decisions listed
const RECENT_DECISIONS: usize = 5;

pub const NO_STATE_MESSAGE: &str = "No state file found.";

/// Print a human-readable summary of the state document
pub fn run(layout: &Layout) -> Result<()> {
    for line in report(layout)? {
        println!("{}", line);
    }
    Ok(())
}

/// Summary lines for the project, or the no-state notice
pub fn report(layout: &Layout) -> Result<Vec<String>> {
    let store = StateStore::new(layout.state_file());
    let Some(loaded) = store.load().context("Failed to load state file")? else {
        return Ok(vec![NO_STATE_MESSAGE.to_string()]);
    };

    let config = FwdevConfig::load(&layout.config_file()).context("Failed to load config.toml")?;
    let manager = CheckpointManager::new(layout.clone(), config.backups);
    let tally = BackupTally::collect(&manager, &loaded.state);

    Ok(render(&loaded.state, &tally))
}

/// Integrity counts over all checkpoint records
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackupTally {
    pub intact: usize,
    pub modified: usize,
    pub missing: usize,
    pub unverified: usize,
}

impl BackupTally {
    pub fn collect(manager: &CheckpointManager, state: &ProjectState) -> Self {
        let mut tally = Self::default();
        for record in &state.checkpoints {
            match manager.verify(record) {
                BackupIntegrity::Intact => tally.intact += 1,
                BackupIntegrity::Modified => tally.modified += 1,
                BackupIntegrity::Missing => tally.missing += 1,
                BackupIntegrity::Unverified => tally.unverified += 1,
            }
        }
        tally
    }
}

/// Summary lines for a state document
pub fn render(state: &ProjectState, tally: &BackupTally) -> Vec<String> {
    let mut lines = Vec::new();

    let phase = match state.current_phase {
        Some(n) => format!("{} - {}", n, phase_name(n)),
        None => "? - Unknown".to_string(),
    };
    let updated = state
        .updated_at
        .map_or_else(|| "N/A".to_string(), |t| t.to_rfc3339());

    lines.push(String::new());
    lines.push(format!("Project: {}", state.project_name()).bold().to_string());
    lines.push(format!("Phase: {}", phase));
    lines.push(format!("Updated: {}", updated));
    lines.push(String::new());

    lines.push("Phase Progress:".cyan().to_string());
    for p in Phase::ALL {
        let entry = state
            .phase_entry(i64::from(p.number()))
            .cloned()
            .unwrap_or_default();
        lines.push(format!(
            "  {} Phase {}: {} ({}%)",
            entry.status.checkbox(),
            p.number(),
            p.name(),
            entry.progress_percent()
        ));
    }

    let decisions = state.decisions();
    if !decisions.is_empty() {
        lines.push(String::new());
        lines.push(format!("Decisions: {}", decisions.len()).cyan().to_string());
        let start = decisions.len().saturating_sub(RECENT_DECISIONS);
        for d in &decisions[start..] {
            lines.push(format!("  - {}: {}", d.id_label(), d.label()));
        }
    }

    let modules = state.modules();
    if !modules.is_empty() {
        lines.push(String::new());
        lines.push(format!("Modules: {}", modules.len()).cyan().to_string());
        for m in modules {
            lines.push(format!("  - {}: {}", m.name(), m.status()));
        }
    }

    if let Some(details) = &state.critical_details {
        let mut detail_lines = Vec::new();
        if !details.env_vars.is_empty() {
            detail_lines.push(format!("Environment Variables: {}", details.env_vars.len()));
        }
        if !details.non_standard_paths.is_empty() {
            detail_lines.push(format!("Non-Standard Paths: {}", details.non_standard_paths.len()));
        }
        if !details.api_quirks.is_empty() {
            detail_lines.push(format!("API Quirks: {}", details.api_quirks.len()));
        }
        if !detail_lines.is_empty() {
            lines.push(String::new());
            lines.extend(detail_lines);
        }
    }

    if !state.checkpoints.is_empty() {
        lines.push(String::new());
        lines.push(format!("Checkpoints: {}", state.checkpoints.len()).cyan().to_string());
        lines.push(format!(
            "  Backups: {} intact, {} modified, {} missing, {} unverified",
            tally.intact, tally.modified, tally.missing, tally.unverified
        ));
    }

    lines
}
