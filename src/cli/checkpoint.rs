use crate::layout::Layout;
use crate::models::{phase_name, FwdevConfig};
use crate::state::{BackupRef, CheckpointError, CheckpointManager, DEFAULT_DESCRIPTION};
use crate::Result;
use anyhow::Context;
use colored::Colorize;

pub const NO_STATE_MESSAGE: &str = "No state file found. Nothing to checkpoint.";

/// Create a checkpoint from the words given on the command line
///
/// Returns `None` when there is no state document to checkpoint.
pub fn run(layout: &Layout, words: &[String]) -> Result<Option<BackupRef>> {
    let description = describe(words);
    let config = FwdevConfig::load(&layout.config_file()).context("Failed to load config.toml")?;
    let manager = CheckpointManager::new(layout.clone(), config.backups);

    let backup = match manager.checkpoint(&description) {
        Ok(backup) => Some(backup),
        Err(CheckpointError::NoState) => None,
        Err(e) => return Err(e).context("Failed to create checkpoint"),
    };

    for line in render(backup.as_ref()) {
        println!("{}", line);
    }

    Ok(backup)
}

/// Output lines for a checkpoint attempt
pub fn render(backup: Option<&BackupRef>) -> Vec<String> {
    let Some(backup) = backup else {
        return vec![NO_STATE_MESSAGE.yellow().to_string()];
    };

    let phase = backup
        .record
        .phase
        .map_or_else(|| "?".to_string(), |n| format!("{} ({})", n, phase_name(n)));

    let mut lines = vec![
        format!("Checkpoint created: {}", backup.file_name)
            .green()
            .bold()
            .to_string(),
        format!(
            "Phase: {}, Project: {}, Progress: {}%",
            phase, backup.project_name, backup.record.progress
        ),
        format!("Backup: {}", backup.record.backup),
    ];
    for evicted in &backup.evicted {
        lines.push(format!("Evicted old backup: {}", evicted).bright_black().to_string());
    }

    lines
}

/// Join argument words; no words means "manual"
fn describe(words: &[String]) -> String {
    let joined = words.join(" ");
    if joined.trim().is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateStore;
    use tempfile::TempDir;

    #[test]
    fn test_words_are_joined() {
        assert_eq!(describe(&["before".to_string(), "phase 4".to_string()]), "before phase 4");
        assert_eq!(describe(&[]), "manual");
    }

    #[test]
    fn test_no_state_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::new(temp.path());

        assert!(run(&layout, &[]).unwrap().is_none());
        assert!(!layout.backup_dir().exists());

        colored::control::set_override(false);
        assert_eq!(
            render(None),
            vec!["No state file found. Nothing to checkpoint.".to_string()]
        );
    }

    #[test]
    fn test_output_names_phase_and_project() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::new(temp.path());
        std::fs::create_dir_all(layout.blueprint_dir()).unwrap();
        std::fs::write(
            layout.state_file(),
            r#"{"projectName": "shop", "currentPhase": 3, "phases": {"3": {"progress": 45}}}"#,
        )
        .unwrap();

        let backup = run(&layout, &["before".to_string(), "refactor".to_string()])
            .unwrap()
            .unwrap();

        colored::control::set_override(false);
        let lines = render(Some(&backup));
        assert_eq!(lines[0], format!("Checkpoint created: {}", backup.file_name));
        assert_eq!(lines[1], "Phase: 3 (Planning), Project: shop, Progress: 45%");
        assert_eq!(lines[2], format!("Backup: {}", backup.record.backup));
        assert!(backup.file_name.ends_with("-before-refactor.json"));
    }

    #[test]
    fn test_checkpoint_honours_configured_retention() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::new(temp.path());
        std::fs::create_dir_all(layout.blueprint_dir()).unwrap();
        std::fs::write(layout.state_file(), r#"{"projectName": "shop", "currentPhase": 1}"#).unwrap();
        std::fs::write(layout.config_file(), "[backups]\nmax_count = 1\n").unwrap();

        let first = run(&layout, &["one".to_string()]).unwrap().unwrap();
        let second = run(&layout, &["two".to_string()]).unwrap().unwrap();

        assert_eq!(second.evicted, vec![first.file_name]);
        let state = StateStore::new(layout.state_file()).load().unwrap().unwrap().state;
        assert_eq!(state.checkpoints.len(), 2);
        assert_eq!(state.checkpoints[1].description, "two");
    }
}
