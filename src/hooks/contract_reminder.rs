//! Pre-write advisory gate: remind about the API contract before source edits
//!
//! Only ever produces an advisory. Blocking is reserved for an actual
//! contract-violation check and is not something a reminder may do.

use super::{read_payload, HookError, HookEvent, HookOutcome};
use crate::layout::Layout;
use crate::models::FwdevConfig;
use tokio::io::AsyncRead;

pub const REMINDER: &str = "Reminder: API endpoints must match .framework-blueprints/03-api-planning/api-contracts.md. Verify endpoint paths, methods, and response schemas before writing.";

pub async fn run<R>(layout: &Layout, payload: R) -> Result<HookOutcome, HookError>
where
    R: AsyncRead + Unpin,
{
    if !layout.blueprint_dir().is_dir() {
        return Ok(HookOutcome::Skipped("no blueprint directory"));
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

    Ok(evaluate(layout, &HookEvent::parse(&payload)?))
}

/// Decide on an event that has already been parsed
pub fn evaluate(layout: &Layout, event: &HookEvent) -> HookOutcome {
    let Some(path) = event.touched_path() else {
        return HookOutcome::Skipped("no file path");
    };

    if !looks_like_source(&path) {
        return HookOutcome::Skipped("not application source");
    }

    if !layout.contracts_file().is_file() {
        return HookOutcome::Skipped("no contracts file");
    }

    HookOutcome::Advisory(REMINDER.to_string())
}

/// Application source or route code, by path shape
pub fn looks_like_source(path: &str) -> bool {
    path.contains("src/") || path.contains("routes/")
}
