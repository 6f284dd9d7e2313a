use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use fwdev::cli::hook::HookCommands;
use fwdev::{Layout, Result, ValidationMode};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fwdev")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Framework blueprint state tracker and validator", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate state, API contracts and blueprint links
    Validate {
        /// Which passes to run
        #[arg(value_enum, default_value_t = ValidationMode::All)]
        mode: ValidationMode,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Back up the state document and record a checkpoint
    Checkpoint {
        /// Free-text description
        description: Vec<String>,
    },

    /// Show a summary of the project state
    Summary,

    /// Report a previous session at session start
    #[command(name = "session-start")]
    SessionStart,

    /// Hook adapters (read the event payload from stdin)
    #[command(subcommand)]
    Hook(HookCommands),

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            1
        }
    };

    std::process::exit(code);
}

/// Diagnostics go to stderr; stdout belongs to command and hook output
fn init_tracing() {
    let filter = EnvFilter::try_from_env("FWDEV_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let layout = match cli.root {
        Some(root) => Layout::new(root),
        None => match Layout::from_current_dir() {
            Ok(layout) => layout,
            // Hooks must not fail the host, even here
            Err(e) => match cli.command {
                Commands::Hook(cmd) => return Ok(fwdev::cli::hook::exit_without_root(cmd, &e)),
                Commands::SessionStart => return Ok(0),
                _ => return Err(e.into()),
            },
        },
    };

    match cli.command {
        Commands::Validate { mode, json } => {
            let report = fwdev::cli::validate::run(&layout, mode, json)?;
            Ok(if report.is_clean() { 0 } else { 1 })
        }

        Commands::Checkpoint { description } => {
            fwdev::cli::checkpoint::run(&layout, &description)?;
            Ok(0)
        }

        Commands::Summary => {
            fwdev::cli::summary::run(&layout)?;
            Ok(0)
        }

        Commands::SessionStart => {
            fwdev::cli::session_start::run(&layout);
            Ok(0)
        }

        Commands::Hook(cmd) => Ok(fwdev::cli::hook::run(&layout, cmd)),

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "fwdev", &mut io::stdout());
            Ok(0)
        }
    }
}
