//! Decides whether a base-revision finding and a head-revision finding denote
//! the same underlying problem, tolerating shifted and renamed locations.

use std::path::Path;

use crate::core::diff::{FileDiffEntry, FileDiffMap};
use crate::core::Issue;

/// An issue together with the plugin and audit that produced it.
///
/// Matching identity is (plugin slug, audit slug, file, position), never the
/// message, which may differ between runs for the same finding.
#[derive(Clone, Copy, Debug)]
pub struct AuditIssue<'a> {
    pub plugin: &'a str,
    pub audit: &'a str,
    pub issue: &'a Issue,
}

impl<'a> AuditIssue<'a> {
    pub fn new(plugin: &'a str, audit: &'a str, issue: &'a Issue) -> Self {
        Self {
            plugin,
            audit,
            issue,
        }
    }
}

/// Whether `base` (from the previous report) and `head` (from the current
/// report) are the same finding.
///
/// Different checks are never the same finding, even when messages or
/// locations coincide. Locations are compared after projecting the base
/// position through the head file's line-shift entry, and ranges match on
/// overlap rather than equality: an audit that reported lines 100-103 before
/// two lines were inserted upstream legitimately reports 102-105 now.
pub fn issues_match(base: &AuditIssue, head: &AuditIssue, diffs: &FileDiffMap) -> bool {
    if base.plugin != head.plugin || base.audit != head.audit {
        return false;
    }

    match (&base.issue.source, &head.issue.source) {
        (None, None) => true,
        (Some(base_src), Some(head_src)) => {
            let entry = match resolve_file(&base_src.file, &head_src.file, diffs) {
                Some(entry) => entry,
                None => return false,
            };
            match (&base_src.position, &head_src.position) {
                (None, None) => true,
                (Some(base_pos), Some(head_pos)) => {
                    let adjusted = match entry {
                        Some(e) => e.adjust_range(base_pos),
                        None => *base_pos,
                    };
                    adjusted.overlaps(head_pos)
                }
                // One side located, the other not: treat as distinct findings.
                _ => false,
            }
        }
        _ => false,
    }
}

/// Resolve the base file forward to the head file.
///
/// Returns the diff entry to project lines through (`Some(None)` means the
/// paths are equal and the file has no recorded changes), or `None` when the
/// two paths do not denote the same logical file. A rename entry with an
/// empty hunk list matches purely by rename.
fn resolve_file<'a>(
    base_file: &Path,
    head_file: &Path,
    diffs: &'a FileDiffMap,
) -> Option<Option<&'a FileDiffEntry>> {
    let entry = diffs.get(head_file);
    if let Some(e) = entry {
        if e.original_file.as_deref() == Some(base_file) {
            return Some(Some(e));
        }
    }
    if base_file == head_file {
        return Some(entry);
    }
    None
}
