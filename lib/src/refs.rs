//! Symbolic and direct refs: `HEAD` and the `refs/heads/*` / `refs/tags/*`
//! hierarchy.
//!
//! A ref file holds either a bare 40-character hash, or `ref: <other-ref>`
//! for a symbolic pointer (`HEAD` is itself conventionally such a pointer at
//! `refs/heads/<branch>`). Resolution follows the symbolic chain, bounded to
//! guard against cycles the same way real Git does.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RefError;
use crate::lock::{lock_path_for, LockFile};
use crate::object_id::ObjectHash;

const MAX_SYMBOLIC_HOPS: u32 = 10;
const SYMBOLIC_PREFIX: &str = "ref: ";

/// What a ref file directly contains, before any symbolic resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// A direct commit hash.
    Direct(ObjectHash),
    /// A symbolic pointer at another ref's path, relative to the
    /// repository's refs root (e.g. `"refs/heads/main"`).
    Symbolic(String),
}

fn read_ref_file(path: &Path) -> Result<RefTarget, RefError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RefError::NotFound(path.display().to_string())
        } else {
            RefError::Io(e)
        }
    })?;
    let trimmed = contents.trim_end_matches('\n');
    if let Some(target) = trimmed.strip_prefix(SYMBOLIC_PREFIX) {
        return Ok(RefTarget::Symbolic(target.trim().to_string()));
    }
    ObjectHash::from_hex(trimmed)
        .map(RefTarget::Direct)
        .ok_or_else(|| RefError::Malformed(contents))
}

/// Reads `HEAD` and resolves it to a commit hash, following any symbolic
/// chain.
pub fn read_head(repo_root: &Path) -> Result<ObjectHash, RefError> {
    resolve_ref_path(repo_root, &repo_root.join("HEAD"), &mut Vec::new())
}

/// Resolves a ref given by its path relative to `repo_root` (e.g.
/// `"refs/heads/main"`) to a commit hash.
pub fn resolve_ref(repo_root: &Path, ref_name: &str) -> Result<ObjectHash, RefError> {
    resolve_ref_path(repo_root, &repo_root.join(ref_name), &mut Vec::new())
}

fn resolve_ref_path(repo_root: &Path, path: &Path, visited: &mut Vec<PathBuf>) -> Result<ObjectHash, RefError> {
    if visited.len() as u32 >= MAX_SYMBOLIC_HOPS {
        return Err(RefError::TooManyHops(MAX_SYMBOLIC_HOPS));
    }
    if visited.contains(&path.to_path_buf()) {
        return Err(RefError::Cycle(path.display().to_string()));
    }
    visited.push(path.to_path_buf());

    match read_ref_file(path)? {
        RefTarget::Direct(hash) => Ok(hash),
        RefTarget::Symbolic(target) => resolve_ref_path(repo_root, &repo_root.join(target), visited),
    }
}

/// Overwrites the ref at `ref_name` (relative to `repo_root`) with a direct
/// hash, under `<ref>.lock`.
pub fn write_ref(repo_root: &Path, ref_name: &str, hash: ObjectHash) -> Result<(), RefError> {
    let path = repo_root.join(ref_name);
    write_ref_contents(&path, &format!("{}\n", hash.hex()))
}

/// Overwrites `HEAD` with a symbolic pointer at `ref_name` (e.g.
/// `"refs/heads/main"`).
pub fn write_symbolic_ref(repo_root: &Path, target: &str) -> Result<(), RefError> {
    let path = repo_root.join("HEAD");
    write_ref_contents(&path, &format!("{SYMBOLIC_PREFIX}{target}\n"))
}

fn write_ref_contents(path: &Path, contents: &str) -> Result<(), RefError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(RefError::Io)?;
    }
    let lock_path = lock_path_for(path);
    let _lock = LockFile::acquire(&lock_path)?;
    fs::write(path, contents).map_err(RefError::Io)?;
    Ok(())
}
