//! Session-start reporter: summarize a previous session if one exists

use crate::layout::Layout;
use crate::models::phase_name;
use crate::state::StateStore;

/// Lines to print at session start; `None` when there is no state document
///
/// Never fails: an unreadable document becomes a one-line notice.
pub fn report(layout: &Layout) -> Option<Vec<String>> {
    let store = StateStore::new(layout.state_file());
    if !store.exists() {
        return None;
    }

    let state = match store.load() {
        Ok(Some(loaded)) => loaded.state,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "state file unreadable at session start");
            return Some(vec![format!(
                "[framework-dev] State file found but unreadable: {}",
                e
            )]);
        }
    };

    let (phase, name) = match state.current_phase {
        Some(n) => (n.to_string(), phase_name(n)),
        None => ("?".to_string(), "Unknown"),
    };
    let updated = state
        .updated_at
        .map_or_else(|| "unknown".to_string(), |t| t.to_rfc3339());

    Some(vec![
        format!(
            "[framework-dev] Previous session found: \"{}\"",
            state.project_name()
        ),
        format!(
            "  Phase {} ({}) - {}% complete",
            phase,
            name,
            state.current_progress()
        ),
        format!("  Last updated: {}", updated),
        "  Use \"/framework-dev resume\" to continue or start fresh.".to_string(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_project(state_json: Option<&str>) -> (TempDir, Layout) {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path());
        if let Some(json) = state_json {
            std::fs::create_dir_all(layout.blueprint_dir()).unwrap();
            std::fs::write(layout.state_file(), json).unwrap();
        }
        (temp_dir, layout)
    }

    #[test]
    fn test_absent_state_reports_nothing() {
        let (_temp, layout) = setup_project(None);
        assert_eq!(report(&layout), None);
    }

    #[test]
    fn test_previous_session_summary() {
        let (_temp, layout) = setup_project(Some(
            r#"{
                "projectName": "shop",
                "currentPhase": 5,
                "phases": {"5": {"status": "in_progress", "progress": 60}},
                "updatedAt": "2024-03-01T10:00:00Z"
            }"#,
        ));

        let lines = report(&layout).unwrap();
        assert_eq!(lines[0], "[framework-dev] Previous session found: \"shop\"");
        assert_eq!(lines[1], "  Phase 5 (Execution) - 60% complete");
        assert_eq!(lines[2], "  Last updated: 2024-03-01T10:00:00+00:00");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_missing_fields_render_placeholders() {
        let (_temp, layout) = setup_project(Some("{}"));

        let lines = report(&layout).unwrap();
        assert_eq!(lines[0], "[framework-dev] Previous session found: \"unnamed\"");
        assert_eq!(lines[1], "  Phase ? (Unknown) - 0% complete");
        assert_eq!(lines[2], "  Last updated: unknown");
    }

    #[test]
    fn test_unreadable_state_is_a_notice() {
        let (_temp, layout) = setup_project(Some("not json"));

        let lines = report(&layout).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[framework-dev] State file found but unreadable:"));
    }
}
