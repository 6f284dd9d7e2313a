//! Cross-file link validator
//!
//! Walks the blueprint documents and checks every backtick-quoted source
//! reference (e.g. `` `src/routes/users.ts` ``) against the real file system.
//! Only references under the source prefix are checked.

use crate::layout::Layout;
use crate::models::{Finding, FindingCategory, FindingLevel, LinkConfig, PassKind, PassReport};
use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use walkdir::WalkDir;

pub struct LinkValidator {
    layout: Layout,
    config: LinkConfig,
}

impl LinkValidator {
    pub fn new(layout: &Layout, config: LinkConfig) -> Self {
        Self {
            layout: layout.clone(),
            config,
        }
    }

    /// Run the links pass
    pub fn validate(&self) -> PassReport {
        let blueprint_dir = self.layout.blueprint_dir();
        if !blueprint_dir.is_dir() {
            return PassReport::skipped(PassKind::Links, "No blueprint directory found");
        }

        let re = match reference_regex(&self.config.extensions) {
            Ok(re) => re,
            Err(e) => {
                return PassReport::from_findings(
                    PassKind::Links,
                    vec![Finding::new(
                        FindingLevel::Fail,
                        FindingCategory::UnreadableDocument,
                        format!("{:#}", e),
                    )],
                );
            }
        };

        let mut findings = Vec::new();
        let mut scanned = 0usize;
        let mut unvisited = Vec::new();

        // walkdir keeps its own stack of open directories; depth is bounded
        // and symlinks are not followed, so cycles cannot occur.
        let walker = WalkDir::new(&blueprint_dir)
            .max_depth(self.config.max_depth)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable blueprint entry");
                    continue;
                }
            };

            let relative = entry
                .path()
                .strip_prefix(&blueprint_dir)
                .unwrap_or(entry.path())
                .to_path_buf();

            if entry.file_type().is_dir() && entry.depth() == self.config.max_depth {
                tracing::warn!(
                    dir = %relative.display(),
                    max_depth = self.config.max_depth,
                    "depth limit reached, not scanning below"
                );
                unvisited.push(relative.display().to_string());
                continue;
            }

            if !entry.file_type().is_file() || !self.is_document(entry.path()) {
                continue;
            }

            let content = match std::fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "skipping unreadable document");
                    continue;
                }
            };
            scanned += 1;

            for reference in self.broken_references(&re, &content) {
                findings.push(
                    Finding::new(
                        FindingLevel::Warn,
                        FindingCategory::BrokenReference,
                        format!("{} references missing: {}", relative.display(), reference),
                    )
                    .in_file(relative.clone()),
                );
            }
        }

        let report = PassReport::from_findings(PassKind::Links, findings)
            .with_note(format!("Scanned {} documents", scanned));
        if unvisited.is_empty() {
            report
        } else {
            report.with_note(format!(
                "Depth limit {} reached, not scanned: {}",
                self.config.max_depth,
                unvisited.join(", ")
            ))
        }
    }

    fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.document_extensions.iter().any(|d| d == ext))
    }

    /// Source-prefixed references in `content` that do not exist on disk
    fn broken_references<'a>(&self, re: &Regex, content: &'a str) -> Vec<&'a str> {
        re.captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|reference| reference.starts_with(&self.config.source_prefix))
            .filter(|reference| !self.layout.resolve(reference).exists())
            .collect()
    }
}

/// Regex matching `` `...<.ext>` `` for the given extensions
pub fn reference_regex(extensions: &[String]) -> Result<Regex> {
    let alternatives = extensions
        .iter()
        .map(|ext| regex::escape(ext))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"`([^`]*\.(?:{}))`", alternatives))
        .context("Failed to compile file reference regex")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PassStatus;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn setup_project() -> (TempDir, Layout) {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path());
        std::fs::create_dir_all(layout.blueprint_dir().join("02-structure/nested")).unwrap();
        std::fs::create_dir_all(layout.resolve("src/routes")).unwrap();
        std::fs::write(layout.resolve("src/routes/users.ts"), "export {}").unwrap();
        (temp_dir, layout)
    }

    #[test]
    fn test_missing_blueprint_dir_skips() {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path());
        let report = LinkValidator::new(&layout, LinkConfig::default()).validate();

        assert_eq!(report.status, PassStatus::Skip);
    }

    #[test]
    fn test_flags_only_missing_source_references() {
        let (_temp, layout) = setup_project();
        std::fs::write(
            layout.blueprint_dir().join("02-structure/nested/modules.md"),
            "Routes live in `src/routes/users.ts` and `src/routes/orders.ts`.\n\
             See `docs/guide.md` and `lib/missing.js` and `src/readme.txt`.\n",
        )
        .unwrap();

        let report = LinkValidator::new(&layout, LinkConfig::default()).validate();

        assert_eq!(report.status, PassStatus::Fail);
        assert_eq!(report.issues, 1);
        assert_eq!(
            report.findings[0].file,
            Some(PathBuf::from("02-structure/nested/modules.md"))
        );
        assert!(report.findings[0]
            .message
            .ends_with("references missing: src/routes/orders.ts"));
    }

    #[test]
    fn test_only_documents_are_scanned() {
        let (_temp, layout) = setup_project();
        std::fs::write(
            layout.blueprint_dir().join("notes.txt"),
            "`src/ghost.ts`",
        )
        .unwrap();
        std::fs::write(layout.blueprint_dir().join("overview.md"), "`src/routes/users.ts`").unwrap();

        let report = LinkValidator::new(&layout, LinkConfig::default()).validate();

        assert_eq!(report.status, PassStatus::Pass);
        assert_eq!(report.notes, vec!["Scanned 1 documents".to_string()]);
    }

    #[test]
    fn test_reference_regex_extensions() {
        let re = reference_regex(&LinkConfig::default().extensions).unwrap();
        let found: Vec<_> = re
            .captures_iter("`a.tsx` `b.json` `c.rs` `d.js` `e.md`")
            .map(|c| c[1].to_string())
            .collect();

        assert_eq!(found, vec!["a.tsx", "b.json", "d.js", "e.md"]);
    }

    #[test]
    fn test_depth_limit_is_noted() {
        let (_temp, layout) = setup_project();
        std::fs::write(
            layout.blueprint_dir().join("02-structure/nested/deep.md"),
            "`src/ghost.ts`",
        )
        .unwrap();
        std::fs::write(layout.blueprint_dir().join("top.md"), "`src/routes/users.ts`").unwrap();

        let config = LinkConfig {
            max_depth: 2,
            ..LinkConfig::default()
        };
        let report = LinkValidator::new(&layout, config).validate();

        assert_eq!(report.issues, 0);
        assert_eq!(
            report.notes,
            vec![
                "Scanned 1 documents".to_string(),
                "Depth limit 2 reached, not scanned: 02-structure/nested".to_string(),
            ]
        );

        let report = LinkValidator::new(&layout, LinkConfig::default()).validate();
        assert_eq!(report.issues, 1);
        assert_eq!(report.notes.len(), 1);
    }

    #[test]
    fn test_custom_prefix() {
        let (_temp, layout) = setup_project();
        std::fs::write(
            layout.blueprint_dir().join("plan.md"),
            "`app/main.ts` `src/also-missing.ts`",
        )
        .unwrap();

        let config = LinkConfig {
            source_prefix: "app/".to_string(),
            ..LinkConfig::default()
        };
        let report = LinkValidator::new(&layout, config).validate();

        assert_eq!(report.issues, 1);
        assert!(report.findings[0].message.contains("app/main.ts"));
    }
}
