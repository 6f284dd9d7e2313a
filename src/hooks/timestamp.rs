//! Post-write observer: refresh `updatedAt` when a blueprint file changes

use super::{read_payload, HookError, HookEvent, HookOutcome};
use crate::layout::{Layout, BLUEPRINT_DIR, STATE_FILE};
use crate::models::FwdevConfig;
use crate::state::StateStore;
use tokio::io::AsyncRead;

pub async fn run<R>(layout: &Layout, payload: R) -> Result<HookOutcome, HookError>
where
    R: AsyncRead + Unpin,
{
    let store = StateStore::new(layout.state_file());
    if !store.exists() {
        return Ok(HookOutcome::Skipped("no state file"));
    }

    let config = FwdevConfig::load_or_default(&layout.config_file());
    let Some(payload) = read_payload(
        payload,
        config.hooks.payload_timeout(),
        config.hooks.max_payload_bytes,
    )
    .await?
    else {
        return Ok(HookOutcome::Skipped("no payload"));
    };

    if payload.trim().is_empty() {
        return Ok(HookOutcome::Skipped("empty payload"));
    }

    refresh(&store, &HookEvent::parse(&payload)?)
}

/// Perform the single state update if the event touched a blueprint file
pub fn refresh(store: &StateStore, event: &HookEvent) -> Result<HookOutcome, HookError> {
    let Some(path) = event.touched_path() else {
        return Ok(HookOutcome::Skipped("no file path"));
    };

    if !is_blueprint_file(&path) {
        return Ok(HookOutcome::Skipped("not a blueprint file"));
    }

    // Our own writes to the state document must not retrigger a write
    if path.ends_with(STATE_FILE) {
        return Ok(HookOutcome::Skipped("state file itself"));
    }

    let Some(loaded) = store.load()? else {
        return Ok(HookOutcome::Skipped("no state file"));
    };

    let mut state = loaded.state;
    store.save(&mut state)?;
    Ok(HookOutcome::StateTouched)
}

fn is_blueprint_file(path: &str) -> bool {
    path.contains(&format!("{}/", BLUEPRINT_DIR))
}
