//! The per-run state machine: discover projects, collect current reports,
//! resolve base reports through the cache and a single base-revision
//! checkout, compare, and aggregate.
//!
//! Parallel versus sequential execution is a contract, not an accident:
//! reading already-produced report files is a side-effect-free join done
//! with rayon; collection invocations and per-project comparison mutate
//! shared external state (subprocess caches, the working tree) and run
//! strictly one at a time.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cache::ArtifactCache;
use crate::comparison::{Comparison, ReportComparator};
use crate::config::{OutputPaths, ProjectSettings, WorkspaceConfig};
use crate::core::diff::FileDiffMap;
use crate::core::{GitBranch, ProjectConfig, ProjectFiles, Report};
use crate::errors::ScoremapError;
use crate::monorepo::aggregator;
use crate::monorepo::discovery::{self, CollectionStrategy, DiscoveredWorkspace};
use crate::monorepo::{CommentClient, ProjectOutcome, ProjectStatus, RunSummary};
use crate::output;
use crate::process::{project_cwd, CommandLine, ProcessRunner};
use crate::vcs::{run_in_base_branch, Vcs};

pub struct MonorepoOrchestrator<'a> {
    workspace_root: PathBuf,
    config: WorkspaceConfig,
    runner: &'a dyn ProcessRunner,
    vcs: Option<&'a dyn Vcs>,
    comment_client: &'a dyn CommentClient,
}

/// A project that produced a readable current report.
struct CollectedProject {
    project: ProjectConfig,
    paths: OutputPaths,
    report: Report,
}

impl<'a> MonorepoOrchestrator<'a> {
    pub fn new(
        workspace_root: PathBuf,
        config: WorkspaceConfig,
        runner: &'a dyn ProcessRunner,
        vcs: Option<&'a dyn Vcs>,
        comment_client: &'a dyn CommentClient,
    ) -> Self {
        Self {
            workspace_root,
            config,
            runner,
            vcs,
            comment_client,
        }
    }

    pub fn run(&self) -> Result<RunSummary> {
        let discovered = discovery::discover(&self.workspace_root, &self.config)?;
        info!(
            "discovered {} project(s), strategy: {}",
            discovered.projects.len(),
            match &discovered.strategy {
                CollectionStrategy::Bulk(_) => "bulk",
                CollectionStrategy::PerProject => "per-project",
            }
        );

        let (collected, mut outcomes) = self.collect_current(&discovered)?;

        let base = match (&self.config.compare.base, self.vcs) {
            (Some(base), Some(vcs)) => Some((GitBranch::new(base.clone()), vcs)),
            (Some(_), None) => {
                warn!("base ref configured but no repository available; skipping comparison");
                None
            }
            _ => None,
        };

        let comparisons = match base {
            Some((branch, vcs)) => {
                self.compare_all(&collected, &discovered, &branch, vcs, &mut outcomes)?
            }
            None => {
                for c in &collected {
                    outcomes.push(current_only_outcome(c));
                }
                Vec::new()
            }
        };

        outcomes.sort_by(|a, b| a.name.cmp(&b.name));

        let (merged_json, merged_md, comment_id) = aggregator::aggregate(
            &self.workspace_root,
            &comparisons,
            self.config.compare.skip_comment,
            self.comment_client,
        )?;

        Ok(RunSummary {
            outcomes,
            merged_json,
            merged_md,
            comment_id,
        })
    }

    /// Step 2: produce a current report for every project.
    ///
    /// Bulk workspaces run one collection command; per-project workspaces
    /// run one invocation per project, strictly sequentially (collector
    /// tooling writes to shared caches and is not assumed reentrant).
    /// Reading the produced files back is side-effect-free and joins in
    /// parallel for both strategies.
    fn collect_current(
        &self,
        discovered: &DiscoveredWorkspace,
    ) -> Result<(Vec<CollectedProject>, Vec<ProjectOutcome>)> {
        let mut failures: Vec<ProjectOutcome> = Vec::new();
        let mut readable: Vec<(ProjectConfig, OutputPaths)> = Vec::new();

        match &discovered.strategy {
            CollectionStrategy::Bulk(command) => {
                let output = self.runner.run(command, &self.workspace_root)?;
                if !output.success() {
                    // Individual projects may still have produced output;
                    // the read phase decides per project.
                    warn!(
                        "bulk collection exited with status {}: {}",
                        output.status,
                        output.stderr.trim()
                    );
                }
                for project in &discovered.projects {
                    let settings = self.current_settings(project)?;
                    readable.push((
                        project.clone(),
                        settings.output_paths(&self.workspace_root, project),
                    ));
                }
            }
            CollectionStrategy::PerProject => {
                let bar = collection_bar(discovered.projects.len());
                for project in &discovered.projects {
                    bar.set_message(project.name.clone());
                    let settings = self.current_settings(project)?;
                    let paths = settings.output_paths(&self.workspace_root, project);
                    match self.run_collection(project, &settings) {
                        Ok(()) => readable.push((project.clone(), paths)),
                        Err(e) => failures.push(failed_outcome(&project.name, e.to_string())),
                    }
                    bar.inc(1);
                }
                bar.finish_and_clear();
            }
        }

        // Join: read every produced report in parallel.
        let read: Vec<std::result::Result<CollectedProject, ProjectOutcome>> = readable
            .into_par_iter()
            .map(|(project, paths)| {
                match output::read_report(&paths.report, &project.name) {
                    Ok(report) => Ok(CollectedProject {
                        project,
                        paths,
                        report,
                    }),
                    Err(e) => {
                        let mut outcome = failed_outcome(&project.name, e.to_string());
                        if matches!(e, ScoremapError::MalformedReport { .. }) {
                            outcome.files.current = Some(paths.report.clone());
                        }
                        Err(outcome)
                    }
                }
            })
            .collect();

        let mut collected = Vec::new();
        for item in read {
            match item {
                Ok(c) => collected.push(c),
                Err(outcome) => failures.push(outcome),
            }
        }
        Ok((collected, failures))
    }

    /// Project settings on the current revision. A project that is listed
    /// but not configured here is a workspace configuration error and fails
    /// the whole run.
    fn current_settings(&self, project: &ProjectConfig) -> Result<ProjectSettings> {
        ProjectSettings::load(&self.workspace_root, project, "the current revision")
            .map_err(Into::into)
    }

    fn run_collection(
        &self,
        project: &ProjectConfig,
        settings: &ProjectSettings,
    ) -> std::result::Result<(), ScoremapError> {
        let command = self.collection_command(settings).ok_or_else(|| {
            ScoremapError::collection(&project.name, "no collection command configured")
        })?;
        let cwd = project_cwd(&self.workspace_root, &project.root);
        let output = self
            .runner
            .run(&command, &cwd)
            .map_err(|e| ScoremapError::collection(&project.name, e.to_string()))?;
        if !output.success() {
            return Err(ScoremapError::collection(
                &project.name,
                format!(
                    "'{}' exited with status {}: {}",
                    command.program,
                    output.status,
                    output.stderr.trim()
                ),
            ));
        }
        Ok(())
    }

    fn collection_command(&self, settings: &ProjectSettings) -> Option<CommandLine> {
        settings
            .command
            .clone()
            .or_else(|| self.config.collect.default_command.clone())
    }

    /// Steps 4 and 5: resolve base reports (cache first, then one shared
    /// checkout for the misses) and compare each project sequentially.
    fn compare_all(
        &self,
        collected: &[CollectedProject],
        discovered: &DiscoveredWorkspace,
        branch: &GitBranch,
        vcs: &dyn Vcs,
        outcomes: &mut Vec<ProjectOutcome>,
    ) -> Result<Vec<Comparison>> {
        let base_sha = vcs.commit_sha(&branch.ref_name)?;
        let diffs = vcs.diff_map(&branch.ref_name)?;
        let cache = ArtifactCache::resolve(&self.workspace_root);

        let mut previous: HashMap<String, Report> = HashMap::new();
        let mut misses: Vec<&CollectedProject> = Vec::new();
        for c in collected {
            match cache.load_base_report(&c.project.name, &base_sha)? {
                Some(report) => {
                    previous.insert(c.project.name.clone(), report);
                }
                None => misses.push(c),
            }
        }

        let mut base_statuses: HashMap<String, ProjectStatus> = HashMap::new();
        if !misses.is_empty() {
            info!(
                "collecting base reports for {} project(s) on '{}'",
                misses.len(),
                branch.ref_name
            );
            let miss_projects: Vec<ProjectConfig> =
                misses.iter().map(|c| c.project.clone()).collect();
            let strategy = discovered.strategy.clone();
            let fresh = run_in_base_branch(vcs, branch, || {
                Ok(self.collect_base(&miss_projects, &strategy, branch))
            })?;
            for (name, result) in fresh {
                match result {
                    Ok(report) => {
                        cache.store_base_report(&name, &base_sha, &report)?;
                        previous.insert(name, report);
                    }
                    Err(e @ ScoremapError::ConfigurationAbsent { .. }) => {
                        warn!("{e}; skipping comparison");
                        base_statuses.insert(
                            name,
                            ProjectStatus::SkippedOnBase {
                                reason: e.to_string(),
                            },
                        );
                    }
                    Err(e) => {
                        warn!("base collection failed: {e}");
                        base_statuses.insert(
                            name,
                            ProjectStatus::Failed {
                                reason: e.to_string(),
                            },
                        );
                    }
                }
            }
        }

        // Step 5: compare sequentially by contract (comparison may shell out
        // to revision-control tooling that is not reentrant).
        let mut comparisons = Vec::new();
        for c in collected {
            if let Some(prev) = previous.get(&c.project.name) {
                let comparison =
                    ReportComparator::new(c.report.clone(), prev.clone(), diffs.clone())
                        .compare();
                // Base collection reused the same output directory; rewrite
                // the current artifacts so they reflect the head revision.
                output::write_report(&c.paths.report, &c.report)?;
                output::persist_comparison(&c.paths, &comparison)?;
                outcomes.push(ProjectOutcome {
                    name: c.project.name.clone(),
                    status: ProjectStatus::Compared,
                    files: ProjectFiles {
                        current: Some(c.paths.report.clone()),
                        comparison: Some(c.paths.comparison_md.clone()),
                    },
                    new_issues: Some(comparison.new_issues.clone()),
                });
                comparisons.push(comparison);
            } else {
                let status = base_statuses
                    .remove(&c.project.name)
                    .unwrap_or(ProjectStatus::CurrentOnly);
                output::write_report(&c.paths.report, &c.report)?;
                outcomes.push(ProjectOutcome {
                    name: c.project.name.clone(),
                    status,
                    files: ProjectFiles {
                        current: Some(c.paths.report.clone()),
                        comparison: None,
                    },
                    new_issues: None,
                });
            }
        }
        Ok(comparisons)
    }

    /// Collect base reports for every cache miss inside one checkout.
    ///
    /// Runs with the working tree at the base revision; strictly sequential.
    /// Per-project errors are recorded, never propagated, so one missing
    /// project cannot abort its siblings' base collection.
    fn collect_base(
        &self,
        misses: &[ProjectConfig],
        strategy: &CollectionStrategy,
        branch: &GitBranch,
    ) -> Vec<(String, std::result::Result<Report, ScoremapError>)> {
        if let CollectionStrategy::Bulk(command) = strategy {
            match self.runner.run(command, &self.workspace_root) {
                Ok(output) if !output.success() => warn!(
                    "bulk base collection exited with status {}",
                    output.status
                ),
                Err(e) => warn!("bulk base collection failed to start: {e}"),
                _ => {}
            }
        }

        misses
            .iter()
            .map(|project| {
                let result = self.collect_base_project(project, strategy, branch);
                (project.name.clone(), result)
            })
            .collect()
    }

    fn collect_base_project(
        &self,
        project: &ProjectConfig,
        strategy: &CollectionStrategy,
        branch: &GitBranch,
    ) -> std::result::Result<Report, ScoremapError> {
        let settings = ProjectSettings::load(&self.workspace_root, project, &branch.ref_name)?;
        if matches!(strategy, CollectionStrategy::PerProject) {
            self.run_collection(project, &settings)?;
        }
        let paths = settings.output_paths(&self.workspace_root, project);
        output::read_report(&paths.report, &project.name)
    }
}

fn collection_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn current_only_outcome(c: &CollectedProject) -> ProjectOutcome {
    ProjectOutcome {
        name: c.project.name.clone(),
        status: ProjectStatus::CurrentOnly,
        files: ProjectFiles {
            current: Some(c.paths.report.clone()),
            comparison: None,
        },
        new_issues: None,
    }
}

fn failed_outcome(name: &str, reason: String) -> ProjectOutcome {
    ProjectOutcome {
        name: name.to_string(),
        status: ProjectStatus::Failed { reason },
        files: ProjectFiles::default(),
        new_issues: None,
    }
}

/// Load a pre-computed line-shift map from a JSON file, for callers that
/// compare two report files directly without a repository.
pub fn load_diff_map(path: &Path) -> Result<FileDiffMap> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read diff map {}: {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid diff map {}: {e}", path.display()))
}
