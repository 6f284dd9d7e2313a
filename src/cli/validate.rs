use crate::layout::Layout;
use crate::models::{FindingLevel, FwdevConfig, PassKind, PassReport, PassStatus, ValidationMode, ValidationReport};
use crate::validator;
use crate::Result;
use anyhow::Context;
use colored::Colorize;

const RULE_WIDTH: usize = 40;

/// Run the validator and print the report
///
/// Returns the report so the caller can derive the exit status.
pub fn run(layout: &Layout, mode: ValidationMode, json: bool) -> Result<ValidationReport> {
    let config = FwdevConfig::load(&layout.config_file()).context("Failed to load config.toml")?;
    let report = validator::run(layout, &config, mode);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(mode, &report);
    }

    Ok(report)
}

fn print_report(mode: ValidationMode, report: &ValidationReport) {
    println!(
        "{}",
        format!("Framework Blueprint Validator (mode: {})", mode.name()).cyan().bold()
    );
    println!("{}", "=".repeat(RULE_WIDTH));

    for pass in &report.passes {
        print_pass(pass);
    }

    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    let total = format!("Total issues: {}", report.total_issues());
    if report.is_clean() {
        println!("{}", total.green().bold());
    } else {
        println!("{}", total.red().bold());
    }
}

fn print_pass(pass: &PassReport) {
    println!();
    println!("{}", format!("== {} ==", pass.kind.title()).bold());

    if pass.status == PassStatus::Skip {
        let reason = pass.skip_reason.as_deref().unwrap_or("nothing to validate");
        println!("{}", format!("SKIP: {}", reason).bright_black());
        return;
    }

    for note in &pass.notes {
        println!("  {}", note);
    }

    for finding in &pass.findings {
        let line = format!("  {}", finding.format());
        match finding.level {
            FindingLevel::Fail => println!("{}", line.red()),
            FindingLevel::Warn => println!("{}", line.yellow()),
        }
    }

    println!("  Result: {}", result_label(pass));
}

fn result_label(pass: &PassReport) -> String {
    match (pass.status, pass.kind) {
        (PassStatus::Pass, _) => "PASS".green().to_string(),
        (_, PassKind::Links) => format!("{} broken links found", pass.issues).red().to_string(),
        _ => format!("{} issues found", pass.issues).red().to_string(),
    }
}
