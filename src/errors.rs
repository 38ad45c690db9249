//! Error taxonomy for the comparison engine.
//!
//! Errors fall into two classes: per-project conditions the orchestrator
//! recovers from locally (a skip or a degraded project result), and
//! infrastructure failures that abort the whole run. `is_fatal` encodes the
//! split so callers never have to pattern-match at every decision point.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoremapError {
    /// Project has no scoremap configuration on the revision being read.
    /// Skipped with a warning during base-revision resolution; fatal during
    /// current-revision resolution.
    #[error("project '{project}' is not configured on {reference}")]
    ConfigurationAbsent { project: String, reference: String },

    /// Collector subprocess failed or produced unreadable output. Degrades
    /// one project; the run continues.
    #[error("collection failed for project '{project}': {reason}")]
    CollectionFailure { project: String, reason: String },

    /// Artifact store unreachable, as opposed to a simple cache miss.
    #[error("artifact cache I/O failure at {path}: {reason}")]
    CacheIo { path: PathBuf, reason: String },

    #[error("failed to check out '{reference}': {reason}")]
    Checkout { reference: String, reason: String },

    /// Restore failures corrupt every subsequent run and are surfaced even
    /// when they happen during cleanup of another error.
    #[error("failed to restore working tree to '{reference}': {reason}")]
    Restore { reference: String, reason: String },

    /// A report that exists but cannot be parsed. Fatal for that project's
    /// comparison only.
    #[error("malformed report at {path}: {reason}")]
    MalformedReport { path: PathBuf, reason: String },
}

impl ScoremapError {
    pub fn configuration_absent(project: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::ConfigurationAbsent {
            project: project.into(),
            reference: reference.into(),
        }
    }

    pub fn collection(project: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CollectionFailure {
            project: project.into(),
            reason: reason.into(),
        }
    }

    pub fn cache_io(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CacheIo {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn checkout(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Checkout {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub fn restore(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Restore {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_report(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedReport {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error aborts the run rather than degrading one project.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::CacheIo { .. } | Self::Checkout { .. } | Self::Restore { .. } => true,
            Self::ConfigurationAbsent { .. }
            | Self::CollectionFailure { .. }
            | Self::MalformedReport { .. } => false,
        }
    }
}
