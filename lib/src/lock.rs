//! Advisory lock files guarding the staging index and individual refs.
//!
//! Mirrors Git's own `index.lock` / `<ref>.lock` convention: a lock is held
//! by atomically creating a sibling file with `create_new`, the same
//! don't-overwrite-don't-follow-symlink idiom `jj-lib`'s working copy uses
//! when writing files it must not silently clobber. Dropping the guard
//! removes the lock file, so an early return or panic still releases it.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::LockError;

/// A held lock, represented on disk as a zero-length file at `path` that did
/// not exist before [`LockFile::acquire`] was called.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Atomically creates `path`, failing with [`LockError::LockHeld`] if it
    /// already exists.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, LockError> {
        let path = path.into();
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_file) => {
                tracing::trace!(path = %path.display(), "acquired lock");
                Ok(Self { path })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(LockError::LockHeld(path))
            }
            Err(e) => Err(LockError::Io(e)),
        }
    }

    /// The on-disk lock file path, conventionally `<target>.lock`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the (already-created) lock file for writing, e.g. to stage the
    /// new index contents before renaming it over the real index path.
    pub fn open_for_write(&self) -> io::Result<File> {
        OpenOptions::new().write(true).truncate(true).open(&self.path)
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        tracing::trace!(path = %self.path.display(), "released lock");
    }
}

/// Appends `.lock` to a path, the conventional sibling lock file name.
pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_owned()).unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}
