use anyhow::Result;
use log::warn;
use std::path::PathBuf;

use crate::config::WorkspaceConfig;
use crate::monorepo::{
    CommandCommentClient, CommentClient, LogCommentClient, MonorepoOrchestrator, RunSummary,
};
use crate::output::terminal;
use crate::process::SystemRunner;
use crate::vcs::{Git2Vcs, Vcs};

pub struct CiConfig {
    pub workspace: PathBuf,
    pub base: Option<String>,
    pub skip_comment: bool,
}

/// Entry point of the `ci` subcommand: wire the real collaborators and run
/// the orchestrator once.
pub fn run_ci(ci: CiConfig) -> Result<RunSummary> {
    let workspace_root = ci
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| ci.workspace.clone());

    let mut config = WorkspaceConfig::load(&workspace_root)?;
    if let Some(base) = ci.base {
        config.compare.base = Some(base);
    }
    if ci.skip_comment {
        config.compare.skip_comment = true;
    }

    let runner = SystemRunner;
    let vcs = match Git2Vcs::discover(&workspace_root) {
        Ok(vcs) => Some(vcs),
        Err(e) => {
            warn!("{e:#}; comparison disabled");
            None
        }
    };

    let comment_client: Box<dyn CommentClient + '_> = match &config.compare.comment_command {
        Some(command) => Box::new(CommandCommentClient::new(
            &runner,
            command.clone(),
            workspace_root.clone(),
        )),
        None => Box::new(LogCommentClient),
    };

    let orchestrator = MonorepoOrchestrator::new(
        workspace_root,
        config,
        &runner,
        vcs.as_ref().map(|v| v as &dyn Vcs),
        comment_client.as_ref(),
    );
    let summary = orchestrator.run()?;

    terminal::print_summary(&summary);
    Ok(summary)
}
