// fwdev - framework-dev workflow state tracker
// Records and audits the project state document that the scaffolding workflow mutates

pub mod cli;
pub mod hooks;
pub mod layout;
pub mod models;
pub mod state;
pub mod validator;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use layout::Layout;
pub use models::{FwdevConfig, ProjectState, ValidationMode, ValidationReport};
pub use state::{CheckpointManager, StateStore};
