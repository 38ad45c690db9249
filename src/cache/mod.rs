//! Revision-keyed artifact cache for base reports.
//!
//! A cached base report is read-only input: a hit means the project needs no
//! base-revision collection at all. Lookup is a pure filesystem probe: a
//! miss is `Ok(None)`, never an error; only genuine I/O failure is fatal to
//! the run.

use anyhow::Result;
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::Report;
use crate::errors::ScoremapError;

/// Directory layout: one JSON entry per (project, base commit).
#[derive(Clone, Debug)]
pub struct ArtifactCache {
    base_path: PathBuf,
}

impl ArtifactCache {
    /// Resolve the cache directory: `SCOREMAP_CACHE_DIR` overrides, else
    /// `.scoremap/cache` under the workspace root.
    pub fn resolve(workspace_root: &Path) -> Self {
        let base_path = match std::env::var("SCOREMAP_CACHE_DIR") {
            Ok(custom) => PathBuf::from(custom),
            Err(_) => workspace_root.join(".scoremap").join("cache"),
        };
        Self { base_path }
    }

    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn entry_path(&self, project: &str, commit_sha: &str) -> PathBuf {
        let short = &commit_sha[..commit_sha.len().min(12)];
        self.base_path.join(format!("{project}-{short}.json"))
    }

    /// Look up a previously persisted base report for the project at the
    /// given base commit.
    ///
    /// A corrupt entry is treated as a warned miss: the report is simply
    /// collected again and the entry overwritten.
    pub fn load_base_report(&self, project: &str, commit_sha: &str) -> Result<Option<Report>> {
        let path = self.entry_path(project, commit_sha);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("cache miss for {project} at {commit_sha}");
                return Ok(None);
            }
            Err(e) => {
                return Err(ScoremapError::cache_io(path, e.to_string()).into());
            }
        };
        match serde_json::from_str(&contents) {
            Ok(report) => {
                debug!("cache hit for {project} at {commit_sha}");
                Ok(Some(report))
            }
            Err(e) => {
                warn!(
                    "discarding corrupt cache entry {}: {e}",
                    path.display()
                );
                Ok(None)
            }
        }
    }

    /// Persist a freshly collected base report so later runs skip the
    /// base-revision checkout for this project.
    ///
    /// Written atomically (temp file then rename) so a crashed run never
    /// leaves a truncated entry behind.
    pub fn store_base_report(
        &self,
        project: &str,
        commit_sha: &str,
        report: &Report,
    ) -> Result<()> {
        fs::create_dir_all(&self.base_path)
            .map_err(|e| ScoremapError::cache_io(&self.base_path, e.to_string()))?;
        let path = self.entry_path(project, commit_sha);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| ScoremapError::cache_io(&path, e.to_string()))?;
        fs::write(&tmp, json).map_err(|e| ScoremapError::cache_io(&tmp, e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| ScoremapError::cache_io(&path, e.to_string()))?;
        debug!("stored base report for {project} at {commit_sha}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Report;
    use chrono::Utc;
    use tempfile::TempDir;

    fn fixture_report() -> Report {
        Report {
            package: "api".into(),
            version: "1.2.3".into(),
            commit: Some("0123456789abcdef".into()),
            date: Utc::now(),
            duration_ms: 10,
            plugins: vec![],
            categories: vec![],
        }
    }

    #[test]
    fn miss_returns_none_without_error() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::with_base_path(dir.path().to_path_buf());
        let result = cache.load_base_report("api", "0123456789abcdef").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::with_base_path(dir.path().to_path_buf());
        cache
            .store_base_report("api", "0123456789abcdef", &fixture_report())
            .unwrap();
        let loaded = cache
            .load_base_report("api", "0123456789abcdef")
            .unwrap()
            .expect("entry should exist");
        assert_eq!(loaded.package, "api");
        assert_eq!(loaded.version, "1.2.3");
    }

    #[test]
    fn entries_are_keyed_by_commit() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::with_base_path(dir.path().to_path_buf());
        cache
            .store_base_report("api", "aaaaaaaaaaaaaaaa", &fixture_report())
            .unwrap();
        let other = cache.load_base_report("api", "bbbbbbbbbbbbbbbb").unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn corrupt_entry_is_a_warned_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::with_base_path(dir.path().to_path_buf());
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(dir.path().join("api-0123456789ab.json"), "{not json").unwrap();
        let result = cache.load_base_report("api", "0123456789abcdef").unwrap();
        assert!(result.is_none());
    }
}
