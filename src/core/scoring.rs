//! Weighted score aggregation over the category -> group -> audit hierarchy.
//!
//! Weights are only meaningful relative to siblings in the same list; a list
//! whose weights sum to zero has no defined score and yields `None` rather
//! than dividing by zero.

use crate::core::{CategoryConfig, CategoryRef, Report};

/// Weighted average of a group's referenced audit scores.
///
/// Audits missing from the report are skipped along with their weight, so a
/// partially collected plugin still produces a score over what exists.
pub fn group_score(report: &Report, plugin: &str, group_slug: &str) -> Option<f64> {
    let group = report.find_group(plugin, group_slug)?;
    let scored: Vec<(f64, f64)> = group
        .refs
        .iter()
        .filter_map(|r| {
            report
                .find_audit(plugin, &r.slug)
                .map(|audit| (r.weight, audit.score))
        })
        .collect();
    weighted_average(&scored)
}

/// Weighted average of a category's ref scores.
pub fn category_score(report: &Report, category: &CategoryConfig) -> Option<f64> {
    let scored: Vec<(f64, f64)> = category
        .refs
        .iter()
        .filter_map(|r| match r {
            CategoryRef::Audit {
                plugin,
                slug,
                weight,
            } => report
                .find_audit(plugin, slug)
                .map(|audit| (*weight, audit.score)),
            CategoryRef::Group {
                plugin,
                slug,
                weight,
            } => group_score(report, plugin, slug).map(|score| (*weight, score)),
        })
        .collect();
    weighted_average(&scored)
}

/// All category scores of a report, in category order.
pub fn category_scores(report: &Report) -> Vec<(String, Option<f64>)> {
    report
        .categories
        .iter()
        .map(|c| (c.slug.clone(), category_score(report, c)))
        .collect()
}

fn weighted_average(entries: &[(f64, f64)]) -> Option<f64> {
    let total: f64 = entries.iter().map(|(w, _)| w).sum();
    if total <= 0.0 {
        return None;
    }
    Some(entries.iter().map(|(w, s)| w * s).sum::<f64>() / total)
}
