//! Computes how much a single audit's score change moves each category's
//! aggregate score, recursing through intermediate groups.
//!
//! The result is one number per finding: the fractional weight its audit
//! carries across all categories, used to rank new findings by how much
//! fixing them would move overall scores.

use crate::core::{CategoryConfig, CategoryRef, Report};

/// Total fractional weight the audit carries across all categories of the
/// report. With well-formed weights the sum over one category is at most 1,
/// so the result is bounded by the number of categories referencing the
/// audit.
pub fn audit_impact(plugin: &str, slug: &str, report: &Report) -> f64 {
    report
        .categories
        .iter()
        .map(|category| category_contribution(category, plugin, slug, report))
        .sum()
}

fn category_contribution(
    category: &CategoryConfig,
    plugin: &str,
    slug: &str,
    report: &Report,
) -> f64 {
    let total_weight: f64 = category.refs.iter().map(CategoryRef::weight).sum();
    if total_weight <= 0.0 {
        // A category with zero total weight carries nothing; never divide.
        return 0.0;
    }
    category
        .refs
        .iter()
        .map(|r| match r {
            CategoryRef::Audit {
                plugin: ref_plugin,
                slug: ref_slug,
                weight,
            } => {
                if ref_plugin == plugin && ref_slug == slug {
                    weight / total_weight
                } else {
                    0.0
                }
            }
            CategoryRef::Group { weight, .. } => {
                (weight / total_weight) * group_impact(r, plugin, slug, report)
            }
        })
        .sum()
}

/// Fraction of a group's weight held by the audit: its ref weight over the
/// sum of all ref weights in the group. An audit absent from the group, a
/// group absent from the report, or a zero-weight group all contribute 0.
pub fn group_impact(category_ref: &CategoryRef, plugin: &str, slug: &str, report: &Report) -> f64 {
    let CategoryRef::Group {
        plugin: group_plugin,
        slug: group_slug,
        ..
    } = category_ref
    else {
        return 0.0;
    };
    if group_plugin != plugin {
        return 0.0;
    }
    let Some(group) = report.find_group(group_plugin, group_slug) else {
        return 0.0;
    };
    let total_weight: f64 = group.refs.iter().map(|r| r.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    group
        .refs
        .iter()
        .find(|r| r.slug == slug)
        .map(|r| r.weight / total_weight)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AuditOutput, Group, GroupRef, PluginReport};
    use chrono::Utc;

    fn audit(slug: &str) -> AuditOutput {
        AuditOutput {
            slug: slug.to_string(),
            title: slug.to_string(),
            score: 1.0,
            value: 0.0,
            display_value: None,
            issues: vec![],
        }
    }

    fn group(slug: &str, refs: &[(&str, f64)]) -> Group {
        Group {
            slug: slug.to_string(),
            title: None,
            refs: refs
                .iter()
                .map(|(s, w)| GroupRef {
                    slug: s.to_string(),
                    weight: *w,
                })
                .collect(),
        }
    }

    fn report(plugins: Vec<PluginReport>, categories: Vec<CategoryConfig>) -> Report {
        Report {
            package: "fixture".into(),
            version: "0.0.0".into(),
            commit: None,
            date: Utc::now(),
            duration_ms: 0,
            plugins,
            categories,
        }
    }

    fn audit_ref(plugin: &str, slug: &str, weight: f64) -> CategoryRef {
        CategoryRef::Audit {
            plugin: plugin.into(),
            slug: slug.into(),
            weight,
        }
    }

    fn group_ref(plugin: &str, slug: &str, weight: f64) -> CategoryRef {
        CategoryRef::Group {
            plugin: plugin.into(),
            slug: slug.into(),
            weight,
        }
    }

    fn category(slug: &str, refs: Vec<CategoryRef>) -> CategoryConfig {
        CategoryConfig {
            slug: slug.into(),
            title: slug.into(),
            refs,
        }
    }

    #[test]
    fn one_of_ten_equal_refs_carries_a_tenth() {
        let mut named: Vec<(String, f64)> = (0..10).map(|i| (format!("audit-{i}"), 1.0)).collect();
        named[3].0 = "target".into();
        let plugin = PluginReport {
            slug: "perf".into(),
            title: "Perf".into(),
            audits: named.iter().map(|(s, _)| audit(s)).collect(),
            groups: vec![Group {
                slug: "vitals".into(),
                title: None,
                refs: named
                    .iter()
                    .map(|(s, w)| GroupRef {
                        slug: s.clone(),
                        weight: *w,
                    })
                    .collect(),
            }],
        };
        let r = report(vec![plugin], vec![]);
        let g = group_ref("perf", "vitals", 1.0);
        assert_eq!(group_impact(&g, "perf", "target", &r), 0.1);
    }

    #[test]
    fn audit_absent_from_group_contributes_zero() {
        let plugin = PluginReport {
            slug: "perf".into(),
            title: "Perf".into(),
            audits: vec![audit("lcp")],
            groups: vec![group("vitals", &[("lcp", 1.0)])],
        };
        let r = report(vec![plugin], vec![]);
        let g = group_ref("perf", "vitals", 1.0);
        assert_eq!(group_impact(&g, "perf", "tbt", &r), 0.0);
    }

    #[test]
    fn impact_sums_direct_and_group_contributions() {
        // Category "quality": a group at 99 plus the audit itself at 1 out of
        // a total weight of 100, so the direct share is exactly 0.01.
        // Category "speed": a single group where the audit holds 2 of 25
        // total weight, so the group share is exactly 0.08.
        let plugin = PluginReport {
            slug: "lh".into(),
            title: "Lighthouse".into(),
            audits: vec![audit("tbt"), audit("lcp"), audit("cls")],
            groups: vec![
                group("problems", &[("lcp", 5.0), ("cls", 5.0)]),
                group("vitals", &[("tbt", 2.0), ("lcp", 23.0)]),
            ],
        };
        let categories = vec![
            category(
                "quality",
                vec![
                    group_ref("lh", "problems", 99.0),
                    audit_ref("lh", "tbt", 1.0),
                ],
            ),
            category("speed", vec![group_ref("lh", "vitals", 1.0)]),
        ];
        let r = report(vec![plugin], categories);
        let impact = audit_impact("lh", "tbt", &r);
        assert!((impact - 0.09).abs() < 1e-12, "impact was {impact}");
    }

    #[test]
    fn zero_weight_category_contributes_nothing() {
        let plugin = PluginReport {
            slug: "lh".into(),
            title: "Lighthouse".into(),
            audits: vec![audit("tbt")],
            groups: vec![],
        };
        let categories = vec![category("empty", vec![audit_ref("lh", "tbt", 0.0)])];
        let r = report(vec![plugin], categories);
        assert_eq!(audit_impact("lh", "tbt", &r), 0.0);
    }

    #[test]
    fn per_category_share_never_exceeds_one() {
        let plugin = PluginReport {
            slug: "lh".into(),
            title: "Lighthouse".into(),
            audits: vec![audit("tbt"), audit("lcp")],
            groups: vec![group("vitals", &[("tbt", 7.0), ("lcp", 3.0)])],
        };
        let categories = vec![category(
            "speed",
            vec![group_ref("lh", "vitals", 4.0), audit_ref("lh", "tbt", 6.0)],
        )];
        let r = report(vec![plugin], categories);
        let impact = audit_impact("lh", "tbt", &r);
        // 0.4 * 0.7 + 0.6 = 0.88
        assert!((impact - 0.88).abs() < 1e-12);
        assert!(impact <= 1.0);
    }

    #[test]
    fn group_ref_for_another_plugin_contributes_zero() {
        let plugin = PluginReport {
            slug: "lh".into(),
            title: "Lighthouse".into(),
            audits: vec![audit("tbt")],
            groups: vec![group("vitals", &[("tbt", 1.0)])],
        };
        let r = report(vec![plugin], vec![]);
        let g = group_ref("lh", "vitals", 1.0);
        assert_eq!(group_impact(&g, "eslint", "tbt", &r), 0.0);
    }
}
