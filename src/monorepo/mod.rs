//! Multi-project orchestration: discovery, the run state machine, and result
//! aggregation.

pub mod aggregator;
pub mod discovery;
pub mod orchestrator;

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::{ProjectFiles, ProjectRunResult, RankedIssue};
use crate::process::{CommandLine, ProcessRunner};

pub use discovery::{discover, CollectionStrategy, DiscoveredWorkspace};
pub use orchestrator::MonorepoOrchestrator;

/// Terminal state of one project after a run.
///
/// The final summary enumerates skipped and failed projects distinctly from
/// successfully compared ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Current and base reports existed; a comparison was produced.
    Compared,
    /// Collected on the current revision only (no base configured, or no
    /// base report obtainable).
    CurrentOnly,
    /// Not configured on the base revision; comparison skipped by design.
    SkippedOnBase { reason: String },
    /// Collection or comparison failed for this project; siblings continue.
    Failed { reason: String },
}

/// Everything the run produced for one project.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectOutcome {
    pub name: String,
    pub status: ProjectStatus,
    pub files: ProjectFiles,
    pub new_issues: Option<Vec<RankedIssue>>,
}

impl ProjectOutcome {
    pub fn into_run_result(self) -> ProjectRunResult {
        ProjectRunResult {
            name: self.name,
            files: self.files,
            new_issues: self.new_issues,
        }
    }

    pub fn compared(&self) -> bool {
        self.status == ProjectStatus::Compared
    }
}

/// Workspace-level result of one orchestrated run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcomes: Vec<ProjectOutcome>,
    /// Merged workspace diff artifacts, present when at least one project
    /// produced a comparison.
    pub merged_json: Option<PathBuf>,
    pub merged_md: Option<PathBuf>,
    pub comment_id: Option<u64>,
}

impl RunSummary {
    pub fn compared_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.compared()).count()
    }
}

/// Boundary to the external PR-comment collaborator. At most one comment is
/// created or updated per run.
pub trait CommentClient {
    fn comment(&self, artifact: &Path) -> Result<u64>;
}

/// Runs a configured external command with the artifact path appended.
/// A non-zero exit is an error: a failed comment after a successful
/// comparison aborts the run.
pub struct CommandCommentClient<'a> {
    runner: &'a dyn ProcessRunner,
    command: CommandLine,
    cwd: PathBuf,
}

impl<'a> CommandCommentClient<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, command: CommandLine, cwd: PathBuf) -> Self {
        Self {
            runner,
            command,
            cwd,
        }
    }
}

impl CommentClient for CommandCommentClient<'_> {
    fn comment(&self, artifact: &Path) -> Result<u64> {
        let mut command = self.command.clone();
        command.args.push(artifact.display().to_string());
        let output = self.runner.run(&command, &self.cwd)?;
        if !output.success() {
            anyhow::bail!(
                "comment command '{}' exited with status {}: {}",
                command.program,
                output.status,
                output.stderr.trim()
            );
        }
        // The collaborator prints the comment id on stdout.
        Ok(output.stdout.trim().parse().unwrap_or(0))
    }
}

/// Local-run stand-in that only logs where the artifact lives.
#[derive(Debug, Default)]
pub struct LogCommentClient;

impl CommentClient for LogCommentClient {
    fn comment(&self, artifact: &Path) -> Result<u64> {
        info!("diff summary ready at {}", artifact.display());
        Ok(0)
    }
}
