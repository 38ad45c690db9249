//! Merges per-project comparisons into one workspace-level diff summary and
//! hands it to the PR-comment collaborator.

use anyhow::{Context as _, Result};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::comparison::Comparison;
use crate::monorepo::CommentClient;
use crate::output::{ensure_dir, markdown};

#[derive(Serialize)]
struct MergedSummary<'a> {
    projects: &'a [Comparison],
    total_new_issues: usize,
}

/// Write the merged artifacts and trigger the comment client.
///
/// Produces nothing when no project was compared. At most one comment is
/// created per run; a comment failure after successful comparisons is fatal.
pub fn aggregate(
    workspace_root: &Path,
    comparisons: &[Comparison],
    skip_comment: bool,
    comment_client: &dyn CommentClient,
) -> Result<(Option<PathBuf>, Option<PathBuf>, Option<u64>)> {
    if comparisons.is_empty() {
        return Ok((None, None, None));
    }

    let dir = workspace_root.join(".scoremap");
    ensure_dir(&dir)?;

    let merged_json = dir.join("comparison.json");
    let summary = MergedSummary {
        projects: comparisons,
        total_new_issues: comparisons.iter().map(|c| c.new_issues.len()).sum(),
    };
    fs::write(&merged_json, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("failed to write {}", merged_json.display()))?;

    let merged_md = dir.join("comparison.md");
    fs::write(&merged_md, markdown::render_merged(comparisons))
        .with_context(|| format!("failed to write {}", merged_md.display()))?;

    let comment_id = if skip_comment {
        info!("skip_comment set; not commenting");
        None
    } else {
        let id = comment_client
            .comment(&merged_md)
            .context("failed to publish the diff summary comment")?;
        Some(id)
    };

    Ok((Some(merged_json), Some(merged_md), comment_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ComparisonCounts;
    use anyhow::anyhow;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct RecordingClient {
        calls: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    impl RecordingClient {
        fn new(fail: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    impl CommentClient for RecordingClient {
        fn comment(&self, artifact: &Path) -> Result<u64> {
            self.calls.lock().unwrap().push(artifact.to_path_buf());
            if self.fail {
                return Err(anyhow!("api unreachable"));
            }
            Ok(77)
        }
    }

    fn comparison(package: &str) -> Comparison {
        Comparison {
            package: package.into(),
            previous_commit: None,
            current_commit: None,
            new_issues: vec![],
            categories: vec![],
            counts: ComparisonCounts::default(),
        }
    }

    #[test]
    fn no_comparisons_produce_no_artifacts_and_no_comment() {
        let dir = TempDir::new().unwrap();
        let client = RecordingClient::new(false);
        let (json, md, id) = aggregate(dir.path(), &[], false, &client).unwrap();
        assert!(json.is_none() && md.is_none() && id.is_none());
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn merged_artifacts_are_written_and_commented() {
        let dir = TempDir::new().unwrap();
        let client = RecordingClient::new(false);
        let (json, md, id) =
            aggregate(dir.path(), &[comparison("api"), comparison("web")], false, &client)
                .unwrap();
        assert!(json.unwrap().exists());
        let md = md.unwrap();
        assert!(md.exists());
        assert_eq!(id, Some(77));
        assert_eq!(client.calls.lock().unwrap().clone(), vec![md]);
    }

    #[test]
    fn skip_comment_still_writes_artifacts() {
        let dir = TempDir::new().unwrap();
        let client = RecordingClient::new(false);
        let (_, md, id) = aggregate(dir.path(), &[comparison("api")], true, &client).unwrap();
        assert!(md.unwrap().exists());
        assert!(id.is_none());
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn comment_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let client = RecordingClient::new(true);
        let result = aggregate(dir.path(), &[comparison("api")], false, &client);
        assert!(result.is_err());
    }
}
