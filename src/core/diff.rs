//! Line-shift map between a base and a head revision.
//!
//! The map is consumed, never computed here: the orchestrator obtains it from
//! libgit2's already-computed diff hunks (see `vcs`), or callers supply a
//! pre-computed map file. A file absent from the map is assumed unchanged
//! (identity line mapping).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::LineRange;

/// Per-file line-shift map, keyed by the *current* (head-revision) path.
pub type FileDiffMap = BTreeMap<PathBuf, FileDiffEntry>;

/// How one file changed between the base and head revisions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiffEntry {
    /// Base-revision path when the file was renamed.
    pub original_file: Option<PathBuf>,
    /// Hunks in file order; hunks never overlap.
    #[serde(default)]
    pub line_changes: Vec<LineChange>,
}

/// One hunk: `prev.count` lines starting at `prev.line` in the base revision
/// became `curr.count` lines starting at `curr.line` in the head revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChange {
    pub prev: LineHunk,
    pub curr: LineHunk,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineHunk {
    pub line: u32,
    pub count: u32,
}

impl LineChange {
    /// Net movement this hunk applies to every base line after it.
    fn delta(&self) -> i64 {
        (self.curr.line as i64 + self.curr.count as i64)
            - (self.prev.line as i64 + self.prev.count as i64)
    }

    /// Whether a base line falls inside the hunk's previous range.
    ///
    /// A `prev.count` of zero is a pure insertion: no base line is inside.
    fn contains_prev(&self, line: u32) -> bool {
        line >= self.prev.line && (line as u64) < self.prev.line as u64 + self.prev.count as u64
    }
}

impl FileDiffEntry {
    /// Project a base-revision line into head-revision coordinates.
    ///
    /// Lines before every hunk are unshifted; a line inside a hunk maps into
    /// the hunk's current range (deleted lines clamp to the hunk's current
    /// start so overlap tests still have a coordinate); lines past a hunk
    /// accumulate its net delta.
    pub fn adjust_line(&self, line: u32) -> u32 {
        let mut delta: i64 = 0;
        for change in &self.line_changes {
            if line < change.prev.line {
                break;
            }
            if change.contains_prev(line) {
                let offset = (line - change.prev.line) as i64;
                let max_offset = (change.curr.count as i64 - 1).max(0);
                return clamp_line(change.curr.line as i64 + offset.min(max_offset));
            }
            delta += change.delta();
        }
        clamp_line(line as i64 + delta)
    }

    /// Project a whole base-revision range into head coordinates.
    pub fn adjust_range(&self, range: &LineRange) -> LineRange {
        let start = self.adjust_line(range.start_line);
        let end = self.adjust_line(range.end());
        LineRange {
            start_line: start,
            // A shrinking hunk can pull the end above the start; keep the
            // range well-formed.
            end_line: Some(end.max(start)),
        }
    }
}

fn clamp_line(line: i64) -> u32 {
    line.clamp(1, u32::MAX as i64) as u32
}
