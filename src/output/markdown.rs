//! Markdown rendering of comparison artifacts.

use std::fmt::Write as _;

use crate::comparison::{CategoryDelta, Comparison};
use crate::core::RankedIssue;

/// Render one project's comparison as a markdown diff.
pub fn render_comparison(comparison: &Comparison) -> String {
    let mut out = String::new();
    writeln!(out, "# Code quality comparison: {}", comparison.package).unwrap();
    writeln!(out).unwrap();
    write_commits(&mut out, comparison);
    write_categories(&mut out, &comparison.categories);
    write_new_issues(&mut out, &comparison.new_issues);
    out
}

/// Render the workspace-level merged diff covering every compared project.
pub fn render_merged(comparisons: &[Comparison]) -> String {
    let total_new: usize = comparisons.iter().map(|c| c.new_issues.len()).sum();
    let mut out = String::new();
    writeln!(out, "# Code quality comparison").unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "{} project(s) compared, {} new issue(s) found.",
        comparisons.len(),
        total_new
    )
    .unwrap();
    for comparison in comparisons {
        writeln!(out).unwrap();
        writeln!(out, "## {}", comparison.package).unwrap();
        writeln!(out).unwrap();
        write_commits(&mut out, comparison);
        write_categories(&mut out, &comparison.categories);
        write_new_issues(&mut out, &comparison.new_issues);
    }
    out
}

fn write_commits(out: &mut String, comparison: &Comparison) {
    if let (Some(prev), Some(curr)) = (&comparison.previous_commit, &comparison.current_commit) {
        writeln!(out, "Compared `{}` against `{}`.", short(curr), short(prev)).unwrap();
        writeln!(out).unwrap();
    }
}

fn short(sha: &str) -> &str {
    &sha[..sha.len().min(7)]
}

fn write_categories(out: &mut String, categories: &[CategoryDelta]) {
    if categories.is_empty() {
        return;
    }
    writeln!(out, "| Category | Before | After | Change |").unwrap();
    writeln!(out, "| :-- | --: | --: | --: |").unwrap();
    for delta in categories {
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            delta.title,
            format_score(delta.previous),
            format_score(delta.current),
            format_delta(delta.delta)
        )
        .unwrap();
    }
    writeln!(out).unwrap();
}

fn write_new_issues(out: &mut String, issues: &[RankedIssue]) {
    if issues.is_empty() {
        writeln!(out, "No new issues.").unwrap();
        return;
    }
    writeln!(out, "## New issues ({})", issues.len()).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "| Impact | Severity | Check | Message | Location |").unwrap();
    writeln!(out, "| --: | :-- | :-- | :-- | :-- |").unwrap();
    for issue in issues {
        writeln!(
            out,
            "| {:.4} | {} | {}/{} | {} | {} |",
            issue.impact,
            issue.severity,
            issue.plugin,
            issue.audit,
            escape_cell(&issue.message),
            format_location(issue)
        )
        .unwrap();
    }
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.0}", s * 100.0),
        None => "–".to_string(),
    }
}

fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!("{:+.1}", d * 100.0),
        None => "–".to_string(),
    }
}

fn format_location(issue: &RankedIssue) -> String {
    match (&issue.file, &issue.position) {
        (Some(file), Some(position)) => match position.end_line {
            Some(end) if end != position.start_line => {
                format!("{}:{}-{}", file.display(), position.start_line, end)
            }
            _ => format!("{}:{}", file.display(), position.start_line),
        },
        (Some(file), None) => file.display().to_string(),
        _ => String::new(),
    }
}

fn escape_cell(message: &str) -> String {
    message.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ComparisonCounts;
    use crate::core::{LineRange, Severity};
    use std::path::PathBuf;

    fn comparison_with_issue() -> Comparison {
        Comparison {
            package: "api".into(),
            previous_commit: Some("0123456789abcdef".into()),
            current_commit: Some("fedcba9876543210".into()),
            new_issues: vec![RankedIssue {
                plugin: "eslint".into(),
                audit: "no-console".into(),
                severity: Severity::Warning,
                message: "unexpected console statement".into(),
                file: Some(PathBuf::from("src/a.ts")),
                position: Some(LineRange::new(10, Some(12))),
                impact: 0.09,
            }],
            categories: vec![CategoryDelta {
                slug: "quality".into(),
                title: "Quality".into(),
                previous: Some(0.8),
                current: Some(0.75),
                delta: Some(-0.05),
            }],
            counts: ComparisonCounts {
                current_issues: 4,
                previous_issues: 3,
                new_issues: 1,
            },
        }
    }

    #[test]
    fn renders_commits_categories_and_issues() {
        let md = render_comparison(&comparison_with_issue());
        assert!(md.contains("# Code quality comparison: api"));
        assert!(md.contains("Compared `fedcba9` against `0123456`."));
        assert!(md.contains("| Quality | 80 | 75 | -5.0 |"));
        assert!(md.contains("src/a.ts:10-12"));
        assert!(md.contains("eslint/no-console"));
    }

    #[test]
    fn merged_output_counts_across_projects() {
        let md = render_merged(&[comparison_with_issue(), comparison_with_issue()]);
        assert!(md.contains("2 project(s) compared, 2 new issue(s) found."));
        assert!(md.contains("## api"));
    }

    #[test]
    fn empty_comparison_says_no_new_issues() {
        let mut comparison = comparison_with_issue();
        comparison.new_issues.clear();
        let md = render_comparison(&comparison);
        assert!(md.contains("No new issues."));
    }
}
