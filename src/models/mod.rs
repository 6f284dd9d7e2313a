pub mod config;
pub mod phase;
pub mod project_state;
pub mod validation;

pub use config::{ConfigError, FwdevConfig, HookConfig, LinkConfig, RetentionPolicy};
pub use phase::{phase_name, Phase, PhaseEntry, PhaseStatus, PHASE_COUNT};
pub use project_state::{
    CheckpointRecord, CriticalDetails, Decision, ModuleEntry, ModuleRecord, ProjectState,
    REQUIRED_FIELDS,
};
pub use validation::{
    Finding, FindingCategory, FindingLevel, PassKind, PassReport, PassStatus, ValidationMode,
    ValidationReport,
};
