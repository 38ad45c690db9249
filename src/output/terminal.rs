//! Terminal summary of an orchestrated run.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::monorepo::{ProjectStatus, RunSummary};

/// Render the per-project summary table.
pub fn summary_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Project", "Status", "New issues", "Artifacts"]);
    for outcome in &summary.outcomes {
        let status = match &outcome.status {
            ProjectStatus::Compared => "compared".to_string(),
            ProjectStatus::CurrentOnly => "collected".to_string(),
            ProjectStatus::SkippedOnBase { reason } => format!("skipped ({reason})"),
            ProjectStatus::Failed { reason } => format!("failed ({reason})"),
        };
        let new_issues = outcome
            .new_issues
            .as_ref()
            .map(|issues| issues.len().to_string())
            .unwrap_or_else(|| "–".to_string());
        let artifacts = outcome
            .files
            .comparison
            .as_ref()
            .or(outcome.files.current.as_ref())
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        table.add_row(vec![outcome.name.clone(), status, new_issues, artifacts]);
    }
    table
}

/// Print the run summary, skipped and failed projects called out separately
/// from compared ones.
pub fn print_summary(summary: &RunSummary) {
    println!("{}", summary_table(summary));

    let compared = summary.compared_count();
    let skipped: Vec<&str> = summary
        .outcomes
        .iter()
        .filter(|o| matches!(o.status, ProjectStatus::SkippedOnBase { .. }))
        .map(|o| o.name.as_str())
        .collect();
    let failed: Vec<&str> = summary
        .outcomes
        .iter()
        .filter(|o| matches!(o.status, ProjectStatus::Failed { .. }))
        .map(|o| o.name.as_str())
        .collect();

    println!(
        "{} {} project(s) compared",
        "✓".green().bold(),
        compared
    );
    if !skipped.is_empty() {
        println!(
            "{} skipped on base revision: {}",
            "!".yellow().bold(),
            skipped.join(", ")
        );
    }
    if !failed.is_empty() {
        println!("{} failed: {}", "✗".red().bold(), failed.join(", "));
    }
    if let Some(path) = &summary.merged_md {
        println!("merged diff summary: {}", path.display());
    }
}
