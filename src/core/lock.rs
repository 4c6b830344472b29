//! core::lock
//!
//! Exclusive workspace lock for mutating operations.
//!
//! # Architecture
//!
//! The workspace lock ensures only one process mutates the workspace
//! state (graph, tracking map, object store) at a time. It is held for
//! the whole of a mutating command.
//!
//! # Storage
//!
//! - `<workspace>/.tessera/lock` - Lock file with OS-level exclusive lock
//!
//! # Invariants
//!
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::workspace::fs::TESSERA_DIR;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("workspace is locked by another process")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on the workspace.
///
/// The lock is released when this guard is dropped, so it survives
/// panics inside the guarded operation.
#[derive(Debug)]
pub struct WorkspaceLock {
    /// Path to the lock file.
    path: PathBuf,
    /// The open file handle with the lock held.
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl WorkspaceLock {
    /// Attempt to acquire the workspace lock.
    ///
    /// Uses OS-level file locking via `fs2`, which works across
    /// processes. Non-blocking: if another process holds the lock, this
    /// returns `LockError::AlreadyLocked` immediately.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(workspace_root: &Path) -> Result<Self, LockError> {
        let dir = workspace_root.join(TESSERA_DIR);
        fs::create_dir_all(&dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let path = dir.join("lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Try to acquire the lock, returning None if already held.
    pub fn try_acquire(workspace_root: &Path) -> Result<Option<Self>, LockError> {
        match Self::acquire(workspace_root) {
            Ok(lock) => Ok(Some(lock)),
            Err(LockError::AlreadyLocked) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if the lock is currently held by this guard.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly, ahead of drop.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        // Best-effort release on drop - ignore errors since we're dropping
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_succeeds_and_creates_dir() {
        let temp = TempDir::new().unwrap();
        assert!(!temp.path().join(TESSERA_DIR).exists());

        let lock = WorkspaceLock::acquire(temp.path()).expect("acquire lock");
        assert!(lock.is_held());
        assert!(lock.path().exists());
        assert!(temp.path().join(TESSERA_DIR).exists());
    }

    #[test]
    fn second_acquire_fails() {
        let temp = TempDir::new().unwrap();

        let lock1 = WorkspaceLock::acquire(temp.path()).expect("first acquire");
        assert!(lock1.is_held());

        let result = WorkspaceLock::acquire(temp.path());
        assert!(matches!(result, Err(LockError::AlreadyLocked)));
    }

    #[test]
    fn released_on_drop() {
        let temp = TempDir::new().unwrap();

        {
            let lock = WorkspaceLock::acquire(temp.path()).expect("first acquire");
            assert!(lock.is_held());
        }

        let lock2 = WorkspaceLock::acquire(temp.path()).expect("second acquire");
        assert!(lock2.is_held());
    }

    #[test]
    fn explicit_release_allows_reacquire() {
        let temp = TempDir::new().unwrap();

        let mut lock = WorkspaceLock::acquire(temp.path()).expect("acquire");
        lock.release().expect("release");
        assert!(!lock.is_held());

        let lock2 = WorkspaceLock::acquire(temp.path()).expect("reacquire");
        assert!(lock2.is_held());
    }

    #[test]
    fn try_acquire_returns_none_when_locked() {
        let temp = TempDir::new().unwrap();

        let _lock1 = WorkspaceLock::acquire(temp.path()).expect("first acquire");

        let result = WorkspaceLock::try_acquire(temp.path()).expect("try_acquire");
        assert!(result.is_none());
    }

    #[test]
    fn multiple_release_calls_are_safe() {
        let temp = TempDir::new().unwrap();

        let mut lock = WorkspaceLock::acquire(temp.path()).expect("acquire");
        lock.release().expect("first release");
        lock.release().expect("second release should be ok");
        assert!(!lock.is_held());
    }
}
