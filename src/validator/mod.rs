//! Blueprint validation engine
//!
//! Three independent, read-only passes. Each pass reports pass/fail/skip and
//! an issue count; `run` aggregates the passes a mode selects.

pub mod consistency;
pub mod contracts;
pub mod links;

pub use consistency::ConsistencyValidator;
pub use contracts::ContractValidator;
pub use links::LinkValidator;

use crate::layout::Layout;
use crate::models::{FwdevConfig, PassKind, PassReport, ValidationMode, ValidationReport};

/// Run the passes selected by `mode`, in state/contracts/links order
pub fn run(layout: &Layout, config: &FwdevConfig, mode: ValidationMode) -> ValidationReport {
    let passes = mode
        .passes()
        .into_iter()
        .map(|kind| run_pass(layout, config, kind))
        .collect();

    ValidationReport { passes }
}

pub fn run_pass(layout: &Layout, config: &FwdevConfig, kind: PassKind) -> PassReport {
    match kind {
        PassKind::State => ConsistencyValidator::new(layout).validate(),
        PassKind::Contracts => ContractValidator::new(layout).validate(),
        PassKind::Links => LinkValidator::new(layout, config.links.clone()).validate(),
    }
}
