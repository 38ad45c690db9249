//! Workspace and project configuration.
//!
//! A workspace carries one `scoremap.toml` naming the projects and the
//! comparison settings; each project root carries its own `scoremap.toml`
//! with collection specifics. The per-project file doubles as the existence
//! marker the orchestrator probes when deciding whether a project is
//! configured on a given revision.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::ProjectConfig;
use crate::errors::ScoremapError;
use crate::process::CommandLine;

pub const WORKSPACE_CONFIG_FILE: &str = "scoremap.toml";
pub const PROJECT_CONFIG_FILE: &str = "scoremap.toml";

/// Workspace-level configuration (`scoremap.toml` at the repo root).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default, rename = "project")]
    pub projects: Vec<ProjectEntry>,

    #[serde(default)]
    pub collect: CollectSettings,

    #[serde(default)]
    pub compare: CompareSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    /// Project root, relative to the workspace root. May be a glob pattern
    /// covering several roots; expansion names each match after its
    /// directory.
    pub root: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CollectSettings {
    /// Workspace-level command that collects every project in one
    /// invocation. When absent (or unresolvable), collection runs once per
    /// project.
    pub bulk_command: Option<CommandLine>,

    /// Fallback per-project command for projects whose own config does not
    /// name one.
    pub default_command: Option<CommandLine>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompareSettings {
    /// Base ref to compare against; absence disables comparison entirely.
    pub base: Option<String>,

    /// Skip the PR comment even when comparisons exist.
    #[serde(default)]
    pub skip_comment: bool,

    /// External command invoked with the merged diff artifact path appended;
    /// the boundary to the PR-comment API client.
    pub comment_command: Option<CommandLine>,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            base: None,
            skip_comment: false,
            comment_command: None,
        }
    }
}

impl WorkspaceConfig {
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let path = workspace_root.join(WORKSPACE_CONFIG_FILE);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: WorkspaceConfig = toml::from_str(&contents)
            .with_context(|| format!("invalid workspace config at {}", path.display()))?;
        config
            .validate()
            .map_err(|reason| anyhow::anyhow!("invalid workspace config: {reason}"))?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.projects.is_empty() {
            return Err("at least one [[project]] entry is required".into());
        }
        let mut names: Vec<&str> = self.projects.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.projects.len() {
            return Err("project names must be unique".into());
        }
        Ok(())
    }
}

/// Per-project configuration (`scoremap.toml` in the project root).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Collection command for this project.
    pub command: Option<CommandLine>,

    /// Directory the collector persists into, relative to the project root.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".scoremap")
}

/// Persisted-output file paths for one project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub report: PathBuf,
    pub comparison_json: PathBuf,
    pub comparison_md: PathBuf,
}

impl ProjectSettings {
    /// Read a project's settings from its root.
    ///
    /// A missing file means the project is not configured on the revision
    /// currently checked out: `ConfigurationAbsent`, which the caller maps
    /// to a skip (base resolution) or a fatal error (current resolution).
    pub fn load(
        workspace_root: &Path,
        project: &ProjectConfig,
        reference: &str,
    ) -> Result<Self, ScoremapError> {
        let path = workspace_root
            .join(&project.root)
            .join(PROJECT_CONFIG_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScoremapError::configuration_absent(&project.name, reference));
            }
            Err(e) => {
                return Err(ScoremapError::collection(
                    &project.name,
                    format!("unreadable project config {}: {e}", path.display()),
                ));
            }
        };
        toml::from_str(&contents).map_err(|e| {
            ScoremapError::collection(
                &project.name,
                format!("invalid project config {}: {e}", path.display()),
            )
        })
    }

    /// Resolve the persisted-output file paths for a project.
    pub fn output_paths(&self, workspace_root: &Path, project: &ProjectConfig) -> OutputPaths {
        let dir = workspace_root.join(&project.root).join(&self.output_dir);
        OutputPaths {
            report: dir.join("report.json"),
            comparison_json: dir.join("comparison.json"),
            comparison_md: dir.join("comparison.md"),
        }
    }
}
