//! Project state persistence
//!
//! - `StateStore`: whole-document load/save of 00-project-state.json with a
//!   revision check against concurrent writers
//! - `CheckpointManager`: immutable backups plus the append-only checkpoint log

mod checkpoint;
mod store;

pub use checkpoint::{
    backup_base_name, calculate_checksum, sanitize_description, BackupIntegrity, BackupRef,
    CheckpointError, CheckpointManager, DEFAULT_DESCRIPTION,
};
pub use store::{LoadedState, StateError, StateStore};
