//! # File Locking
//!
//! Serializes access to a state file or audit log across processes.
//!
//! Two schedulers pointed at the same data directory must never interleave a
//! read and a write of the same record. Every file-backed operation holds an
//! exclusive advisory lock (`fs2`: flock on Unix, LockFile on Windows) on a
//! sidecar `.lock` file for its whole read-modify-write.

use crate::domain::StoreError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive lock held until dropped (RAII).
///
/// ```ignore
/// let _lock = FileLock::acquire(Path::new("/data/qi/state.json.lock"))?;
/// // read, modify, write
/// ```
#[derive(Debug)]
pub struct FileLock {
    /// Kept open to hold the lock
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the exclusive lock on `path` is held.
    pub fn acquire(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| lock_error(path, e))?;
        file.lock_exclusive().map_err(|e| lock_error(path, e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Take the lock only if nobody holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| lock_error(path, e))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(_) => Ok(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // The lock file stays; removing it would race with the next waiter.
        let _ = self.file.unlock();
    }
}

fn lock_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Lock {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Sidecar lock path for a data file: `state.json` -> `state.json.lock`.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}
