//! Per-project comparison of a current (head) report against a previous
//! (base) report: unmatched findings are new, and each new finding is ranked
//! by its impact on overall scores.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::comparison::matcher::{issues_match, AuditIssue};
use crate::comparison::scorer::audit_impact;
use crate::core::diff::FileDiffMap;
use crate::core::scoring::category_score;
use crate::core::{RankedIssue, Report};

/// Outcome of comparing one project's two reports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comparison {
    pub package: String,
    pub previous_commit: Option<String>,
    pub current_commit: Option<String>,
    /// Findings present in the current report with no match in the previous
    /// one, ranked by impact.
    pub new_issues: Vec<RankedIssue>,
    pub categories: Vec<CategoryDelta>,
    pub counts: ComparisonCounts,
}

/// Score movement of one category between the two reports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub slug: String,
    pub title: String,
    pub previous: Option<f64>,
    pub current: Option<f64>,
    pub delta: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ComparisonCounts {
    pub current_issues: usize,
    pub previous_issues: usize,
    pub new_issues: usize,
}

/// Compares two well-formed reports for the same project.
///
/// Malformed or missing previous reports are the caller's concern; the
/// orchestrator decides whether a project is compared at all.
pub struct ReportComparator {
    current: Report,
    previous: Report,
    diffs: FileDiffMap,
}

impl ReportComparator {
    pub fn new(current: Report, previous: Report, diffs: FileDiffMap) -> Self {
        Self {
            current,
            previous,
            diffs,
        }
    }

    /// Run the full comparison. Deterministic: identical inputs produce an
    /// identical ranked list.
    pub fn compare(&self) -> Comparison {
        let mut new_issues = self.find_new_issues();
        sort_ranked(&mut new_issues);

        let counts = ComparisonCounts {
            current_issues: count_issues(&self.current),
            previous_issues: count_issues(&self.previous),
            new_issues: new_issues.len(),
        };

        Comparison {
            package: self.current.package.clone(),
            previous_commit: self.previous.commit.clone(),
            current_commit: self.current.commit.clone(),
            new_issues,
            categories: self.category_deltas(),
            counts,
        }
    }

    /// Every current issue with no matching previous issue in the same
    /// audit. An audit absent from the previous report has an empty previous
    /// set, so all of its issues are new.
    fn find_new_issues(&self) -> Vec<RankedIssue> {
        let mut new_issues = Vec::new();
        for plugin in &self.current.plugins {
            for audit in &plugin.audits {
                let previous: Vec<AuditIssue> = self
                    .previous
                    .find_audit(&plugin.slug, &audit.slug)
                    .map(|prev| {
                        prev.issues
                            .iter()
                            .map(|i| AuditIssue::new(&plugin.slug, &audit.slug, i))
                            .collect()
                    })
                    .unwrap_or_default();

                for issue in &audit.issues {
                    let head = AuditIssue::new(&plugin.slug, &audit.slug, issue);
                    let matched = previous
                        .iter()
                        .any(|base| issues_match(base, &head, &self.diffs));
                    if matched {
                        continue;
                    }
                    new_issues.push(RankedIssue {
                        plugin: plugin.slug.clone(),
                        audit: audit.slug.clone(),
                        severity: issue.severity,
                        message: issue.message.clone(),
                        file: issue.source.as_ref().map(|s| s.file.clone()),
                        position: issue.source.as_ref().and_then(|s| s.position),
                        impact: audit_impact(&plugin.slug, &audit.slug, &self.current),
                    });
                }
            }
        }
        new_issues
    }

    fn category_deltas(&self) -> Vec<CategoryDelta> {
        self.current
            .categories
            .iter()
            .map(|category| {
                let current = category_score(&self.current, category);
                let previous = self
                    .previous
                    .categories
                    .iter()
                    .find(|c| c.slug == category.slug)
                    .and_then(|c| category_score(&self.previous, c));
                let delta = match (previous, current) {
                    (Some(p), Some(c)) => Some(c - p),
                    _ => None,
                };
                CategoryDelta {
                    slug: category.slug.clone(),
                    title: category.title.clone(),
                    previous,
                    current,
                    delta,
                }
            })
            .collect()
    }
}

/// Impact descending, then severity (error > warning > info), then file
/// path, then start line. The trailing keys exist purely for determinism.
fn sort_ranked(issues: &mut [RankedIssue]) {
    issues.sort_by(|a, b| {
        b.impact
            .partial_cmp(&a.impact)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.severity.rank().cmp(&b.severity.rank()))
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| {
                let a_line = a.position.map(|p| p.start_line).unwrap_or(0);
                let b_line = b.position.map(|p| p.start_line).unwrap_or(0);
                a_line.cmp(&b_line)
            })
    });
}

fn count_issues(report: &Report) -> usize {
    report
        .plugins
        .iter()
        .flat_map(|p| &p.audits)
        .map(|a| a.issues.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        AuditOutput, CategoryConfig, CategoryRef, Issue, LineRange, PluginReport, Severity,
        SourceLocation,
    };
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn located_issue(severity: Severity, file: &str, line: u32) -> Issue {
        Issue {
            severity,
            message: format!("problem in {file}:{line}"),
            source: Some(SourceLocation {
                file: PathBuf::from(file),
                position: Some(LineRange::single(line)),
            }),
        }
    }

    fn plugin(slug: &str, audits: Vec<AuditOutput>) -> PluginReport {
        PluginReport {
            slug: slug.to_string(),
            title: slug.to_string(),
            audits,
            groups: vec![],
        }
    }

    fn audit_with_issues(slug: &str, issues: Vec<Issue>) -> AuditOutput {
        AuditOutput {
            slug: slug.to_string(),
            title: slug.to_string(),
            score: 0.5,
            value: issues.len() as f64,
            display_value: None,
            issues,
        }
    }

    fn report(plugins: Vec<PluginReport>, categories: Vec<CategoryConfig>) -> Report {
        Report {
            package: "fixture".into(),
            version: "0.0.0".into(),
            commit: Some("abc1234".into()),
            date: Utc::now(),
            duration_ms: 42,
            plugins,
            categories,
        }
    }

    #[test]
    fn identical_reports_produce_no_new_issues() {
        let r = report(
            vec![plugin(
                "eslint",
                vec![audit_with_issues(
                    "no-console",
                    vec![located_issue(Severity::Warning, "src/a.ts", 10)],
                )],
            )],
            vec![],
        );
        let comparison =
            ReportComparator::new(r.clone(), r, BTreeMap::new()).compare();
        assert_eq!(comparison.new_issues.len(), 0);
        assert_eq!(comparison.counts.new_issues, 0);
        assert_eq!(comparison.counts.current_issues, 1);
    }

    #[test]
    fn issues_without_a_previous_audit_are_all_new() {
        let current = report(
            vec![plugin(
                "eslint",
                vec![audit_with_issues(
                    "no-debugger",
                    vec![located_issue(Severity::Error, "src/a.ts", 3)],
                )],
            )],
            vec![],
        );
        let previous = report(vec![plugin("eslint", vec![])], vec![]);
        let comparison = ReportComparator::new(current, previous, BTreeMap::new()).compare();
        assert_eq!(comparison.new_issues.len(), 1);
        assert_eq!(comparison.new_issues[0].audit, "no-debugger");
    }

    #[test]
    fn ranking_orders_by_impact_then_severity_then_path() {
        let categories = vec![CategoryConfig {
            slug: "quality".into(),
            title: "Quality".into(),
            refs: vec![
                CategoryRef::Audit {
                    plugin: "eslint".into(),
                    slug: "heavy".into(),
                    weight: 3.0,
                },
                CategoryRef::Audit {
                    plugin: "eslint".into(),
                    slug: "light".into(),
                    weight: 1.0,
                },
            ],
        }];
        let current = report(
            vec![plugin(
                "eslint",
                vec![
                    audit_with_issues(
                        "light",
                        vec![
                            located_issue(Severity::Info, "src/b.ts", 5),
                            located_issue(Severity::Error, "src/a.ts", 9),
                        ],
                    ),
                    audit_with_issues(
                        "heavy",
                        vec![located_issue(Severity::Warning, "src/z.ts", 1)],
                    ),
                ],
            )],
            categories.clone(),
        );
        let previous = report(vec![plugin("eslint", vec![])], categories);
        let comparison = ReportComparator::new(current, previous, BTreeMap::new()).compare();

        let order: Vec<(&str, Severity)> = comparison
            .new_issues
            .iter()
            .map(|i| (i.audit.as_str(), i.severity))
            .collect();
        assert_eq!(
            order,
            vec![
                ("heavy", Severity::Warning),
                ("light", Severity::Error),
                ("light", Severity::Info),
            ]
        );
        assert!(comparison.new_issues[0].impact > comparison.new_issues[1].impact);
    }

    #[test]
    fn comparison_is_idempotent() {
        let current = report(
            vec![plugin(
                "eslint",
                vec![audit_with_issues(
                    "no-console",
                    vec![
                        located_issue(Severity::Warning, "src/a.ts", 10),
                        located_issue(Severity::Warning, "src/b.ts", 20),
                    ],
                )],
            )],
            vec![],
        );
        let previous = report(vec![plugin("eslint", vec![])], vec![]);

        let first = ReportComparator::new(current.clone(), previous.clone(), BTreeMap::new())
            .compare();
        let second =
            ReportComparator::new(current, previous, BTreeMap::new()).compare();
        let first_json = serde_json::to_string(&first.new_issues).unwrap();
        let second_json = serde_json::to_string(&second.new_issues).unwrap();
        assert_eq!(first_json, second_json);
    }

    #[test]
    fn category_deltas_report_score_movement() {
        let categories = vec![CategoryConfig {
            slug: "quality".into(),
            title: "Quality".into(),
            refs: vec![CategoryRef::Audit {
                plugin: "eslint".into(),
                slug: "no-console".into(),
                weight: 1.0,
            }],
        }];
        let mut current = report(
            vec![plugin("eslint", vec![audit_with_issues("no-console", vec![])])],
            categories.clone(),
        );
        current.plugins[0].audits[0].score = 0.25;
        let mut previous = report(
            vec![plugin("eslint", vec![audit_with_issues("no-console", vec![])])],
            categories,
        );
        previous.plugins[0].audits[0].score = 0.75;

        let comparison = ReportComparator::new(current, previous, BTreeMap::new()).compare();
        assert_eq!(comparison.categories.len(), 1);
        let delta = comparison.categories[0].delta.unwrap();
        assert!((delta + 0.5).abs() < 1e-12);
    }
}
