//! Hook adapters
//!
//! Short-lived handlers invoked by the host on tool-use events. Each adapter:
//! - checks a cheap precondition first and skips when its artifact is absent
//! - reads the event payload with an explicit timeout and size bound
//! - returns `Result<HookOutcome, HookError>`
//!
//! Adapters never fail the host. `settle` is the single place where an
//! adapter error is logged and turned into a silent, successful outcome.

pub mod contract_reminder;
pub mod session;
pub mod timestamp;

use crate::layout::normalize_separators;
use crate::state::StateError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Exit code that tells the host to block the tool call
pub const BLOCK_EXIT_CODE: i32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Failed to read hook payload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hook payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Failed to parse hook payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Event envelope sent by the host
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookEvent {
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
}

/// The part of the tool input adapters care about
///
/// Hosts spell the path key either `file_path` or `filePath`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub file_path: Option<String>,

    #[serde(default, rename = "filePath")]
    pub file_path_camel: Option<String>,
}

impl HookEvent {
    pub fn parse(payload: &str) -> Result<Self, HookError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Path the tool touched, `/`-separated; first non-empty spelling wins
    pub fn touched_path(&self) -> Option<String> {
        let input = self.tool_input.as_ref()?;
        [&input.file_path, &input.file_path_camel]
            .into_iter()
            .flatten()
            .find(|p| !p.is_empty())
            .map(|p| normalize_separators(p))
    }
}

/// What an adapter decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Nothing to do
    Skipped(&'static str),
    /// The state document was updated
    StateTouched,
    /// Message for the host to surface; never blocks
    Advisory(String),
    /// Reserved for contract violations; blocks the tool call
    Block(String),
}

impl HookOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            HookOutcome::Block(_) => BLOCK_EXIT_CODE,
            _ => 0,
        }
    }

    /// JSON the host reads from stdout, if any
    pub fn stdout_payload(&self) -> Option<String> {
        match self {
            HookOutcome::Advisory(message) => serde_json::to_string(&HookResponse {
                hook_specific_output: HookSpecificOutput {
                    additional_context: message.clone(),
                },
            })
            .ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HookResponse {
    hook_specific_output: HookSpecificOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HookSpecificOutput {
    additional_context: String,
}

/// Read the event payload
///
/// Reads at most `max_bytes`. Returns `Ok(None)` if the payload has not been
/// fully received within `timeout`; the adapter then finishes as a no-op.
pub async fn read_payload<R>(
    reader: R,
    timeout: Duration,
    max_bytes: u64,
) -> Result<Option<String>, HookError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut limited = reader.take(max_bytes);

    match tokio::time::timeout(timeout, limited.read_to_end(&mut buf)).await {
        Err(_) => {
            tracing::debug!(?timeout, "no hook payload before timeout");
            Ok(None)
        }
        Ok(read) => {
            read?;
            Ok(Some(String::from_utf8(buf)?))
        }
    }
}

/// Apply the "never fail the host" rule
pub fn settle(adapter: &str, result: Result<HookOutcome, HookError>) -> HookOutcome {
    match result {
        Ok(outcome) => {
            tracing::debug!(hook = adapter, ?outcome, "hook finished");
            outcome
        }
        Err(e) => {
            tracing::warn!(hook = adapter, error = %e, "hook failed, continuing");
            HookOutcome::Skipped("internal error")
        }
    }
}
