//! API Contract Validator
//!
//! Scans `api-contracts.md` for table rows of the form `| METHOD | /path |`.
//!
//! Duplicates are detected on the path alone, ignoring the HTTP method: one
//! path, one resource. `GET /users` and `POST /users` in the same contract are
//! reported. This is a deliberate policy, not a missing method comparison.

use crate::layout::Layout;
use crate::models::{Finding, FindingCategory, FindingLevel, PassKind, PassReport};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;

/// An endpoint row from the contract table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: String,
    pub path: String,
}

pub struct ContractValidator {
    contracts_file: PathBuf,
}

impl ContractValidator {
    pub fn new(layout: &Layout) -> Self {
        Self {
            contracts_file: layout.contracts_file(),
        }
    }

    /// Run the contracts pass
    pub fn validate(&self) -> PassReport {
        if !self.contracts_file.is_file() {
            return PassReport::skipped(PassKind::Contracts, "No contracts file found");
        }

        let endpoints = match std::fs::read_to_string(&self.contracts_file)
            .context("Failed to read contracts file")
            .and_then(|content| parse_endpoints(&content))
        {
            Ok(endpoints) => endpoints,
            Err(e) => {
                return PassReport::from_findings(
                    PassKind::Contracts,
                    vec![Finding::new(
                        FindingLevel::Fail,
                        FindingCategory::UnreadableDocument,
                        format!("{:#}", e),
                    )
                    .in_file(&self.contracts_file)],
                );
            }
        };

        let duplicates = duplicate_paths(&endpoints);
        let note = format!("Found {} endpoints in contract", endpoints.len());

        // One issue for the whole set of duplicates
        if duplicates.is_empty() {
            PassReport::with_issues(PassKind::Contracts, 0, Vec::new()).with_note(note)
        } else {
            let finding = Finding::new(
                FindingLevel::Warn,
                FindingCategory::DuplicatePath,
                format!("Duplicate paths: {}", duplicates.join(", ")),
            )
            .in_file(&self.contracts_file);
            PassReport::with_issues(PassKind::Contracts, 1, vec![finding]).with_note(note)
        }
    }
}

/// Extract `(method, path)` pairs from pipe-delimited table rows
pub fn parse_endpoints(content: &str) -> Result<Vec<Endpoint>> {
    let re = Regex::new(r"\|\s*(GET|POST|PUT|PATCH|DELETE)\s*\|\s*([^|]+)\|")
        .context("Failed to compile endpoint regex")?;

    Ok(re
        .captures_iter(content)
        .map(|caps| Endpoint {
            method: caps[1].trim().to_string(),
            path: caps[2].trim().to_string(),
        })
        .collect())
}

/// Distinct paths that appear more than once, in the order they first repeat
pub fn duplicate_paths(endpoints: &[Endpoint]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    for endpoint in endpoints {
        let count = seen.entry(endpoint.path.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(endpoint.path.clone());
        }
    }

    duplicates
}

// =============================================================================
// Tests
// =============================================================================
