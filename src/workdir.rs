use crate::error::{Error, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Changes the process working directory for as long as the guard is alive. Dropping it returns
/// to whichever directory was current when [`WorkdirGuard::enter`] was called, including when
/// the scope is left through `?` or a panic.
pub struct WorkdirGuard {
    previous: PathBuf,
}

impl WorkdirGuard {
    pub fn enter(path: &Path) -> Result<WorkdirGuard> {
        let previous = std::env::current_dir().map_err(Error::CurrentDir)?;
        std::env::set_current_dir(path).map_err(|source| Error::EnterDir {
            path: path.to_owned(),
            source,
        })?;
        debug!("entered {path:?}");
        Ok(WorkdirGuard { previous })
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        match std::env::set_current_dir(&self.previous) {
            Ok(()) => debug!("returned to {:?}", self.previous),
            Err(e) => warn!("failed to return to {:?}: {e}", self.previous),
        }
    }
}

/// Working directory is process-wide, so tests that move it must not overlap.
#[cfg(test)]
pub(crate) fn lock_working_directory() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn restores_after_scope() {
    let _lock = lock_working_directory();
    let original = std::env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().canonicalize().unwrap();
    {
        let _guard = WorkdirGuard::enter(&target).unwrap();
        assert_eq!(std::env::current_dir().unwrap(), target);
    }
    assert_eq!(std::env::current_dir().unwrap(), original);
}

#[test]
fn nested_guards_unwind_in_order() {
    let _lock = lock_working_directory();
    let original = std::env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let outer = dir.path().canonicalize().unwrap();
    let inner = outer.join("inner");
    std::fs::create_dir(&inner).unwrap();
    {
        let _outer = WorkdirGuard::enter(&outer).unwrap();
        {
            let _inner = WorkdirGuard::enter(&inner).unwrap();
            assert_eq!(std::env::current_dir().unwrap(), inner);
        }
        assert_eq!(std::env::current_dir().unwrap(), outer);
    }
    assert_eq!(std::env::current_dir().unwrap(), original);
}

#[test]
fn missing_directory_is_an_error() {
    let _lock = lock_working_directory();
    let original = std::env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    match WorkdirGuard::enter(&missing) {
        Err(Error::EnterDir { path, .. }) => assert_eq!(path, missing),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("entered a missing directory"),
    }
    assert_eq!(std::env::current_dir().unwrap(), original);
}

#[test]
fn restores_after_panic() {
    let _lock = lock_working_directory();
    let original = std::env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().canonicalize().unwrap();
    let result = std::panic::catch_unwind(|| {
        let _guard = WorkdirGuard::enter(&target).unwrap();
        panic!("phase failed");
    });
    assert!(result.is_err());
    assert_eq!(std::env::current_dir().unwrap(), original);
}
