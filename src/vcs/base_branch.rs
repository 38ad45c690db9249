//! Exclusive ownership of the working tree while a base revision is checked
//! out.
//!
//! The checkout is the single critical section of the whole engine: no other
//! component may read repository files expecting "current" state while it is
//! active. Acquisition is process-wide and non-reentrant; a nested attempt
//! fails fast instead of silently corrupting the tree.

use anyhow::{anyhow, Result};
use log::error;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::GitBranch;
use crate::errors::ScoremapError;
use crate::vcs::Vcs;

static CHECKOUT_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Check out `branch`, run `work`, and restore the original revision on
/// every exit path.
///
/// If the checkout itself fails, `work` never runs and the original revision
/// is untouched. When both `work` and the restore fail, the work error
/// propagates and the restore failure is still reported at error level: a
/// dirty working tree corrupts every subsequent run and must not be
/// swallowed by the triggering error.
pub fn run_in_base_branch<T>(
    vcs: &dyn Vcs,
    branch: &GitBranch,
    work: impl FnOnce() -> Result<T>,
) -> Result<T> {
    if CHECKOUT_ACTIVE
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!(
            "a base-revision checkout is already active; nested checkouts are not supported"
        ));
    }

    let original = match vcs.head_ref() {
        Ok(original) => original,
        Err(e) => {
            CHECKOUT_ACTIVE.store(false, Ordering::SeqCst);
            return Err(e.context("cannot record original revision before checkout"));
        }
    };

    if let Err(e) = vcs.checkout(&branch.ref_name) {
        CHECKOUT_ACTIVE.store(false, Ordering::SeqCst);
        return Err(ScoremapError::checkout(&branch.ref_name, e.to_string()).into());
    }

    let guard = WorkingTreeGuard {
        vcs,
        original,
        released: false,
    };

    let result = work();

    match (result, guard.release()) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(restore)) => Err(restore.into()),
        (Err(work_err), Ok(())) => Err(work_err),
        (Err(work_err), Err(restore)) => {
            error!("{restore}");
            Err(work_err)
        }
    }
}

/// Scoped holder of the working-tree resource. `release` restores
/// explicitly; `Drop` is the backstop for the panic path.
struct WorkingTreeGuard<'a> {
    vcs: &'a dyn Vcs,
    original: String,
    released: bool,
}

impl WorkingTreeGuard<'_> {
    fn release(mut self) -> Result<(), ScoremapError> {
        self.released = true;
        let result = self
            .vcs
            .checkout(&self.original)
            .map_err(|e| ScoremapError::restore(&self.original, e.to_string()));
        CHECKOUT_ACTIVE.store(false, Ordering::SeqCst);
        result
    }
}

impl Drop for WorkingTreeGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.vcs.checkout(&self.original) {
            error!(
                "failed to restore working tree to '{}' while unwinding: {e}",
                self.original
            );
        }
        CHECKOUT_ACTIVE.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diff::FileDiffMap;
    use std::sync::Mutex;

    // The checkout flag is process-wide; serialize the tests that touch it.
    static SERIAL: Mutex<()> = Mutex::new(());

    #[derive(Default)]
    struct FakeVcs {
        log: Mutex<Vec<String>>,
        fail_checkout_of: Option<String>,
    }

    impl FakeVcs {
        fn calls(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl Vcs for FakeVcs {
        fn head_ref(&self) -> Result<String> {
            Ok("main".into())
        }

        fn checkout(&self, reference: &str) -> Result<()> {
            self.log.lock().unwrap().push(reference.to_string());
            if self.fail_checkout_of.as_deref() == Some(reference) {
                return Err(anyhow!("simulated checkout failure"));
            }
            Ok(())
        }

        fn commit_sha(&self, reference: &str) -> Result<String> {
            Ok(format!("sha-of-{reference}"))
        }

        fn diff_map(&self, _base: &str) -> Result<FileDiffMap> {
            Ok(FileDiffMap::new())
        }
    }

    #[test]
    fn restores_original_revision_after_success() {
        let _serial = SERIAL.lock().unwrap();
        let vcs = FakeVcs::default();
        let value =
            run_in_base_branch(&vcs, &GitBranch::new("origin/base"), || Ok(42)).unwrap();
        assert_eq!(value, 42);
        assert_eq!(vcs.calls(), vec!["origin/base".to_string(), "main".to_string()]);
    }

    #[test]
    fn restores_original_revision_when_work_fails() {
        let _serial = SERIAL.lock().unwrap();
        let vcs = FakeVcs::default();
        let result: Result<()> = run_in_base_branch(&vcs, &GitBranch::new("origin/base"), || {
            Err(anyhow!("collection blew up"))
        });
        assert!(result.is_err());
        assert_eq!(vcs.calls(), vec!["origin/base".to_string(), "main".to_string()]);
    }

    #[test]
    fn failed_checkout_never_runs_work() {
        let _serial = SERIAL.lock().unwrap();
        let vcs = FakeVcs {
            fail_checkout_of: Some("origin/base".into()),
            ..Default::default()
        };
        let mut ran = false;
        let result = run_in_base_branch(&vcs, &GitBranch::new("origin/base"), || {
            ran = true;
            Ok(())
        });
        assert!(result.is_err());
        assert!(!ran);
        // Only the failed checkout attempt; no restore needed.
        assert_eq!(vcs.calls(), vec!["origin/base".to_string()]);
    }

    #[test]
    fn restore_failure_is_surfaced_after_successful_work() {
        let _serial = SERIAL.lock().unwrap();
        let vcs = FakeVcs {
            fail_checkout_of: Some("main".into()),
            ..Default::default()
        };
        let result = run_in_base_branch(&vcs, &GitBranch::new("origin/base"), || Ok(()));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("restore"), "got: {err}");
    }

    #[test]
    fn nested_checkout_fails_fast() {
        let _serial = SERIAL.lock().unwrap();
        let vcs = FakeVcs::default();
        let result = run_in_base_branch(&vcs, &GitBranch::new("origin/base"), || {
            let inner: Result<()> =
                run_in_base_branch(&vcs, &GitBranch::new("origin/other"), || Ok(()));
            assert!(inner.is_err());
            Ok(())
        });
        assert!(result.is_ok());
        // The inner attempt never touched the tree.
        assert_eq!(vcs.calls(), vec!["origin/base".to_string(), "main".to_string()]);
    }
}
