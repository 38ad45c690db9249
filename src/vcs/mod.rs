//! Revision-control boundary.
//!
//! `Vcs` is the narrow interface the engine consumes: resolve HEAD, check
//! out a ref, resolve a ref to a commit SHA, and translate an
//! already-computed base..head diff into the line-shift map. Only the
//! base-branch runner may call `checkout`.
//!
//! `Git2Vcs` implements the trait over libgit2. `git2::Repository` is not
//! Send/Sync, so a fresh `Repository` is opened per operation.

pub mod base_branch;

use anyhow::{Context as _, Result};
use git2::{Delta, DiffFindOptions, DiffOptions, Repository};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::core::diff::{FileDiffEntry, FileDiffMap, LineChange, LineHunk};

pub use base_branch::run_in_base_branch;

pub trait Vcs {
    /// Current HEAD: branch shorthand when on a branch, commit SHA when
    /// detached. The value round-trips through `checkout`.
    fn head_ref(&self) -> Result<String>;

    /// Check out a ref, moving HEAD and the working tree.
    fn checkout(&self, reference: &str) -> Result<()>;

    /// Resolve a ref to its full commit SHA.
    fn commit_sha(&self, reference: &str) -> Result<String>;

    /// Line-shift map from `base` to the current HEAD, keyed by head path.
    fn diff_map(&self, base: &str) -> Result<FileDiffMap>;
}

pub struct Git2Vcs {
    repo_path: PathBuf,
}

impl Git2Vcs {
    /// Discover the repository containing `path`.
    pub fn discover(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("no git repository found at {}", path.display()))?;
        let repo_path = repo
            .workdir()
            .context("repository has no working directory")?
            .to_path_buf();
        Ok(Self { repo_path })
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.repo_path)
            .with_context(|| format!("failed to open repository at {}", self.repo_path.display()))
    }
}

impl Vcs for Git2Vcs {
    fn head_ref(&self) -> Result<String> {
        let repo = self.open()?;
        let head = repo.head().context("failed to resolve HEAD")?;
        if head.is_branch() {
            head.shorthand()
                .map(str::to_string)
                .context("HEAD branch name is not valid UTF-8")
        } else {
            let commit = head.peel_to_commit().context("failed to peel HEAD")?;
            Ok(commit.id().to_string())
        }
    }

    fn checkout(&self, reference: &str) -> Result<()> {
        let repo = self.open()?;
        let (object, resolved) = repo
            .revparse_ext(reference)
            .with_context(|| format!("unknown ref '{reference}'"))?;
        let mut builder = git2::build::CheckoutBuilder::new();
        builder.safe();
        repo.checkout_tree(&object, Some(&mut builder))
            .with_context(|| format!("failed to check out tree of '{reference}'"))?;
        match resolved.and_then(|r| r.name().map(str::to_string)) {
            Some(name) => repo.set_head(&name),
            None => repo.set_head_detached(object.id()),
        }
        .with_context(|| format!("failed to move HEAD to '{reference}'"))?;
        Ok(())
    }

    fn commit_sha(&self, reference: &str) -> Result<String> {
        let repo = self.open()?;
        let commit = repo
            .revparse_single(reference)
            .with_context(|| format!("unknown ref '{reference}'"))?
            .peel_to_commit()
            .with_context(|| format!("'{reference}' does not point at a commit"))?;
        Ok(commit.id().to_string())
    }

    fn diff_map(&self, base: &str) -> Result<FileDiffMap> {
        let repo = self.open()?;
        let base_tree = repo
            .revparse_single(base)
            .with_context(|| format!("unknown base ref '{base}'"))?
            .peel_to_commit()?
            .tree()?;
        let head_tree = repo.head()?.peel_to_commit()?.tree()?;

        let mut opts = DiffOptions::new();
        // Minimal hunks: the projection model wants exact changed runs, not
        // context lines.
        opts.context_lines(0);
        let mut diff =
            repo.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut opts))?;
        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))
            .context("rename detection failed")?;

        let map = RefCell::new(FileDiffMap::new());
        diff.foreach(
            &mut |delta, _| {
                if let Some(new_path) = delta.new_file().path() {
                    let original_file = match delta.status() {
                        Delta::Renamed => delta.old_file().path().map(Path::to_path_buf),
                        _ => None,
                    };
                    map.borrow_mut().insert(
                        new_path.to_path_buf(),
                        FileDiffEntry {
                            original_file,
                            line_changes: Vec::new(),
                        },
                    );
                }
                true
            },
            None,
            Some(&mut |delta, hunk| {
                if let Some(new_path) = delta.new_file().path() {
                    if let Some(entry) = map.borrow_mut().get_mut(new_path) {
                        entry.line_changes.push(LineChange {
                            prev: LineHunk {
                                line: hunk.old_start(),
                                count: hunk.old_lines(),
                            },
                            curr: LineHunk {
                                line: hunk.new_start(),
                                count: hunk.new_lines(),
                            },
                        });
                    }
                }
                true
            }),
            None,
        )
        .context("failed to walk diff hunks")?;

        Ok(map.into_inner())
    }
}
