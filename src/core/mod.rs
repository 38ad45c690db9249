pub mod diff;
pub mod scoring;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A full quality report produced by one collection run.
///
/// Reports are write-once: they are produced by the collectors, persisted as
/// JSON, and never mutated afterward. Comparison always operates on two
/// independently produced reports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    pub package: String,
    pub version: String,
    /// Commit the report was collected on, when known.
    pub commit: Option<String>,
    pub date: DateTime<Utc>,
    pub duration_ms: u64,
    pub plugins: Vec<PluginReport>,
    pub categories: Vec<CategoryConfig>,
}

impl Report {
    /// Look up an audit by plugin and audit slug.
    pub fn find_audit(&self, plugin: &str, slug: &str) -> Option<&AuditOutput> {
        self.plugins
            .iter()
            .find(|p| p.slug == plugin)
            .and_then(|p| p.audits.iter().find(|a| a.slug == slug))
    }

    /// Look up a group by plugin and group slug.
    pub fn find_group(&self, plugin: &str, slug: &str) -> Option<&Group> {
        self.plugins
            .iter()
            .find(|p| p.slug == plugin)
            .and_then(|p| p.groups.iter().find(|g| g.slug == slug))
    }
}

/// Output of one plugin: its audits plus the groups it defines.
///
/// `slug` is unique within a report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PluginReport {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub audits: Vec<AuditOutput>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// A single scored check evaluation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditOutput {
    pub slug: String,
    pub title: String,
    /// Normalized score in [0, 1].
    pub score: f64,
    pub value: f64,
    pub display_value: Option<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// One concrete problem instance reported by an audit.
///
/// Matching identity is derived from the owning plugin/audit slugs plus the
/// source location; messages may legitimately differ between runs (e.g.
/// interpolated counts) and never participate in identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    pub source: Option<SourceLocation>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Rank for ordering: errors sort ahead of warnings ahead of info.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub position: Option<LineRange>,
}

/// Inclusive line range; `end_line` omitted means a single line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: u32,
    pub end_line: Option<u32>,
}

impl LineRange {
    pub fn new(start_line: u32, end_line: Option<u32>) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    pub fn single(line: u32) -> Self {
        Self {
            start_line: line,
            end_line: None,
        }
    }

    /// End of the range, defaulting to the start for single-line ranges.
    pub fn end(&self) -> u32 {
        self.end_line.unwrap_or(self.start_line)
    }

    /// Inclusive overlap test.
    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.start_line <= other.end() && other.start_line <= self.end()
    }
}

/// Top-level scored grouping shown to users.
///
/// A category's score is the weighted average of its refs' scores; weights
/// are relative only within the containing list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub slug: String,
    pub title: String,
    pub refs: Vec<CategoryRef>,
}

/// Reference from a category to either a single audit or a plugin group.
///
/// Modeled as an enum with payloads so weight resolution is exhaustive and
/// cannot silently fall through on an unknown ref shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CategoryRef {
    Audit {
        plugin: String,
        slug: String,
        weight: f64,
    },
    Group {
        plugin: String,
        slug: String,
        weight: f64,
    },
}

impl CategoryRef {
    pub fn weight(&self) -> f64 {
        match self {
            CategoryRef::Audit { weight, .. } | CategoryRef::Group { weight, .. } => *weight,
        }
    }
}

/// Plugin-scoped weighted collection of audits, used as an indirection layer
/// inside categories.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    pub slug: String,
    pub title: Option<String>,
    pub refs: Vec<GroupRef>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupRef {
    pub slug: String,
    pub weight: f64,
}

/// One collection unit in a monorepo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub root: PathBuf,
}

/// The base revision to compare against; absence disables comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitBranch {
    pub ref_name: String,
}

impl GitBranch {
    pub fn new(ref_name: impl Into<String>) -> Self {
        Self {
            ref_name: ref_name.into(),
        }
    }
}

/// A new issue ranked by how much fixing it would move overall scores.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankedIssue {
    pub plugin: String,
    pub audit: String,
    pub severity: Severity,
    pub message: String,
    pub file: Option<PathBuf>,
    pub position: Option<LineRange>,
    /// Fractional weight this issue's audit carries across all categories.
    pub impact: f64,
}

/// Artifact paths produced for one project during a run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectFiles {
    pub current: Option<PathBuf>,
    pub comparison: Option<PathBuf>,
}

/// Externally visible output for one project.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectRunResult {
    pub name: String,
    pub files: ProjectFiles,
    pub new_issues: Option<Vec<RankedIssue>>,
}
