//! Enumerates configured projects and decides how collection runs: one bulk
//! command covering the whole workspace, or one invocation per project.

use anyhow::{Context as _, Result};
use log::warn;
use std::path::{Path, PathBuf};

use crate::config::WorkspaceConfig;
use crate::core::ProjectConfig;
use crate::process::CommandLine;

/// How current reports get collected for this workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionStrategy {
    /// One workspace-level command produces every project's report.
    Bulk(CommandLine),
    /// One collection invocation per project, strictly sequential.
    PerProject,
}

#[derive(Clone, Debug)]
pub struct DiscoveredWorkspace {
    pub projects: Vec<ProjectConfig>,
    pub strategy: CollectionStrategy,
}

/// Expand the configured project list and pick the collection strategy.
///
/// Roots may be glob patterns (`apps/*`); each matched directory becomes one
/// project named after the directory. A configured bulk command whose binary
/// cannot be resolved downgrades to per-project collection with a warning
/// rather than failing the run.
pub fn discover(workspace_root: &Path, config: &WorkspaceConfig) -> Result<DiscoveredWorkspace> {
    let mut projects = Vec::new();
    for entry in &config.projects {
        if is_glob(&entry.root) {
            let pattern = workspace_root.join(&entry.root);
            let pattern = pattern
                .to_str()
                .context("project root pattern is not valid UTF-8")?;
            for matched in glob::glob(pattern)
                .with_context(|| format!("invalid project root pattern '{}'", entry.root))?
            {
                let path = matched.context("failed to read glob match")?;
                if !path.is_dir() {
                    continue;
                }
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .context("matched project directory has no name")?
                    .to_string();
                projects.push(ProjectConfig {
                    name,
                    root: relative_root(workspace_root, &path),
                });
            }
        } else {
            let root = workspace_root.join(&entry.root);
            if !root.is_dir() {
                anyhow::bail!(
                    "project '{}' root {} does not exist",
                    entry.name,
                    root.display()
                );
            }
            projects.push(ProjectConfig {
                name: entry.name.clone(),
                root: PathBuf::from(&entry.root),
            });
        }
    }
    projects.sort_by(|a, b| a.name.cmp(&b.name));

    let strategy = match &config.collect.bulk_command {
        Some(command) => {
            if which::which(&command.program).is_ok() {
                CollectionStrategy::Bulk(command.clone())
            } else {
                warn!(
                    "bulk command '{}' not found on PATH; falling back to per-project collection",
                    command.program
                );
                CollectionStrategy::PerProject
            }
        }
        None => CollectionStrategy::PerProject,
    };

    Ok(DiscoveredWorkspace { projects, strategy })
}

fn is_glob(root: &str) -> bool {
    root.contains(['*', '?', '['])
}

fn relative_root(workspace_root: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, workspace_root).unwrap_or_else(|| path.to_path_buf())
}
