// Export modules for library usage
pub mod cache;
pub mod cli;
pub mod commands;
pub mod comparison;
pub mod config;
pub mod core;
pub mod errors;
pub mod monorepo;
pub mod output;
pub mod process;
pub mod vcs;

// Re-export commonly used types
pub use crate::core::{
    AuditOutput, CategoryConfig, CategoryRef, GitBranch, Group, GroupRef, Issue, LineRange,
    PluginReport, ProjectConfig, ProjectRunResult, RankedIssue, Report, Severity, SourceLocation,
};

pub use crate::core::diff::{FileDiffEntry, FileDiffMap, LineChange, LineHunk};

pub use crate::comparison::{
    audit_impact, group_impact, issues_match, AuditIssue, Comparison, ReportComparator,
};

pub use crate::errors::ScoremapError;

pub use crate::monorepo::{
    discover, CollectionStrategy, CommentClient, MonorepoOrchestrator, ProjectOutcome,
    ProjectStatus, RunSummary,
};

pub use crate::vcs::{run_in_base_branch, Git2Vcs, Vcs};
