use crate::hooks::{contract_reminder, settle, timestamp, HookOutcome};
use crate::layout::Layout;
use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCommands {
    /// PostToolUse: refresh the state timestamp after a blueprint file changes
    Timestamp,

    /// PreToolUse: remind about the API contract before source files are written
    #[command(name = "contract-reminder")]
    ContractReminder,
}

impl HookCommands {
    pub fn name(&self) -> &'static str {
        match self {
            HookCommands::Timestamp => "timestamp",
            HookCommands::ContractReminder => "contract-reminder",
        }
    }
}

/// Run a hook adapter against stdin and return the process exit code
///
/// Adapter errors never reach the host: they are logged by `settle` and the
/// hook exits 0. Only `HookOutcome::Block` changes the exit code.
pub fn run(layout: &Layout, command: HookCommands) -> i32 {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::warn!(hook = command.name(), error = %e, "failed to start runtime");
            return 0;
        }
    };

    let result = runtime.block_on(async {
        let stdin = tokio::io::stdin();
        match command {
            HookCommands::Timestamp => timestamp::run(layout, stdin).await,
            HookCommands::ContractReminder => contract_reminder::run(layout, stdin).await,
        }
    });

    // A stdin read that timed out cannot be cancelled; don't wait for it
    runtime.shutdown_background();

    let outcome = settle(command.name(), result);
    emit(&outcome);
    outcome.exit_code()
}

fn emit(outcome: &HookOutcome) {
    if let Some(payload) = outcome.stdout_payload() {
        println!("{}", payload);
    }
    if let HookOutcome::Block(reason) = outcome {
        eprintln!("{}", reason);
    }
}

/// Exit code for a hook invoked where no project root can be determined
pub fn exit_without_root(command: HookCommands, error: &std::io::Error) -> i32 {
    tracing::warn!(hook = command.name(), error = %error, "cannot resolve project root");
    HookOutcome::Skipped("no project root").exit_code()
}
