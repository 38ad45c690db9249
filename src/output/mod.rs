//! Artifact persistence and rendering.

pub mod markdown;
pub mod terminal;

use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

use crate::comparison::Comparison;
use crate::config::OutputPaths;
use crate::core::Report;
use crate::errors::ScoremapError;

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}

/// Read a persisted report, distinguishing unreadable files from malformed
/// contents: the former is a collection problem, the latter a report
/// problem, and the orchestrator treats them differently in its summary.
pub fn read_report(path: &Path, project: &str) -> Result<Report, ScoremapError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ScoremapError::collection(
            project,
            format!("unreadable report {}: {e}", path.display()),
        )
    })?;
    serde_json::from_str(&contents)
        .map_err(|e| ScoremapError::malformed_report(path, e.to_string()))
}

pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Persist one project's comparison: the JSON artifact plus the rendered
/// markdown diff.
pub fn persist_comparison(paths: &OutputPaths, comparison: &Comparison) -> Result<()> {
    if let Some(parent) = paths.comparison_json.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(comparison)?;
    fs::write(&paths.comparison_json, json)
        .with_context(|| format!("failed to write {}", paths.comparison_json.display()))?;
    fs::write(&paths.comparison_md, markdown::render_comparison(comparison))
        .with_context(|| format!("failed to write {}", paths.comparison_md.display()))?;
    Ok(())
}
