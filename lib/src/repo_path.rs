//! Repository-relative paths.
//!
//! Trimmed down from `jj-lib`'s `repo_path.rs` to what the Index,
//! TreeBuilder/TreeWalker, and WorkdirSynchronizer need: a validated,
//! forward-slash, `..`-free, non-absolute path type. Unlike the upstream
//! type, this crate does not split borrowed/owned variants (no `RepoPath` vs
//! `RepoPathBuf`) since nothing here needs to avoid allocating on the hot
//! path — one owned `RepoPathBuf` is enough.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// A path was rejected because it was absolute, contained an empty or `.`/`..`
/// component, or began with the repository's reserved metadata directory
/// name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid repository path: {0:?}")]
pub struct InvalidRepoPathError(pub String);

/// A validated, repository-relative, forward-slash path.
///
/// The root of the repository is represented by the empty path
/// ([`RepoPathBuf::root`]); it has no on-disk entry of its own.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RepoPathBuf {
    // Invariant: no leading/trailing '/', no empty/'.'/'..' component, no
    // internal NUL, forward slashes only.
    value: String,
}

impl RepoPathBuf {
    /// The repository root (no path components).
    pub fn root() -> Self {
        Self {
            value: String::new(),
        }
    }

    /// Validates and wraps `value`, a `/`-separated path already using
    /// forward slashes regardless of host OS.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidRepoPathError> {
        let value: String = value.into();
        if value.is_empty() {
            return Ok(Self::root());
        }
        if value.starts_with('/') || value.ends_with('/') {
            return Err(InvalidRepoPathError(value));
        }
        for component in value.split('/') {
            if component.is_empty() || component == "." || component == ".." {
                return Err(InvalidRepoPathError(value));
            }
            if component.contains('\0') {
                return Err(InvalidRepoPathError(value));
            }
        }
        Ok(Self { value })
    }

    /// Validates `value` against the reserved metadata directory name (the
    /// directory git calls `.git`; this system uses a configurable
    /// equivalent, see [`crate::layout::RepoLayout`]) in addition to the
    /// checks in [`Self::new`].
    pub fn new_checked_against_metadata_dir(
        value: impl Into<String>,
        metadata_dir_name: &str,
    ) -> Result<Self, InvalidRepoPathError> {
        let path = Self::new(value)?;
        if path
            .components()
            .next()
            .is_some_and(|first| first == metadata_dir_name)
        {
            return Err(InvalidRepoPathError(path.value));
        }
        Ok(path)
    }

    /// Returns the internal forward-slash string representation.
    pub fn as_internal_str(&self) -> &str {
        &self.value
    }

    /// True if this is the repository root.
    pub fn is_root(&self) -> bool {
        self.value.is_empty()
    }

    /// Iterates over `/`-separated components.
    pub fn components(&self) -> impl DoubleEndedIterator<Item = &str> + '_ {
        if self.is_root() {
            either::Either::Left(std::iter::empty())
        } else {
            either::Either::Right(self.value.split('/'))
        }
    }

    /// Splits off the final component, returning `(parent, basename)`.
    /// Returns `None` for the root path.
    pub fn split(&self) -> Option<(RepoPathBuf, &str)> {
        if self.is_root() {
            return None;
        }
        match self.value.rsplit_once('/') {
            Some((parent, basename)) => Some((
                RepoPathBuf {
                    value: parent.to_owned(),
                },
                basename,
            )),
            None => Some((RepoPathBuf::root(), self.value.as_str())),
        }
    }

    /// Returns the parent directory path, or `None` for the root.
    pub fn parent(&self) -> Option<RepoPathBuf> {
        self.split().map(|(parent, _)| parent)
    }

    /// Appends a single path component (which must not itself contain `/`).
    pub fn join(&self, component: &str) -> RepoPathBuf {
        debug_assert!(!component.is_empty() && !component.contains('/'));
        let value = if self.is_root() {
            component.to_owned()
        } else {
            format!("{}/{component}", self.value)
        };
        RepoPathBuf { value }
    }

    /// True if `self` is `other`, or a descendant of `other`.
    pub fn starts_with(&self, other: &RepoPathBuf) -> bool {
        if other.is_root() {
            return true;
        }
        self.value == other.value
            || self
                .value
                .strip_prefix(&other.value)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Debug for RepoPathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RepoPathBuf").field(&self.value).finish()
    }
}

impl fmt::Display for RepoPathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl PartialOrd for RepoPathBuf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RepoPathBuf {
    fn cmp(&self, other: &Self) -> Ordering {
        // Plain byte-lexicographic order on the '/'-joined string, as
        // required for Index entries (§4.3: "(path_bytes_lex, stage_asc)").
        self.value.as_bytes().cmp(other.value.as_bytes())
    }
}

impl AsRef<str> for RepoPathBuf {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsafe_paths() {
        assert!(RepoPathBuf::new("/abs").is_err());
        assert!(RepoPathBuf::new("a/../b").is_err());
        assert!(RepoPathBuf::new("a/./b").is_err());
        assert!(RepoPathBuf::new("a//b").is_err());
        assert!(RepoPathBuf::new("a/").is_err());
        assert!(RepoPathBuf::new("..").is_err());
    }

    #[test]
    fn rejects_metadata_dir_prefix() {
        assert!(RepoPathBuf::new_checked_against_metadata_dir(".source/HEAD", ".source").is_err());
        assert!(RepoPathBuf::new_checked_against_metadata_dir("src/.source", ".source").is_ok());
    }

    #[test]
    fn split_and_join() {
        let p = RepoPathBuf::new("x/y/z/w/file.txt").unwrap();
        let (parent, name) = p.split().unwrap();
        assert_eq!(parent.as_internal_str(), "x/y/z/w");
        assert_eq!(name, "file.txt");
        assert_eq!(parent.join("file.txt"), p);
    }

    #[test]
    fn ordering_is_byte_lexicographic() {
        let mut paths = vec![
            RepoPathBuf::new("b").unwrap(),
            RepoPathBuf::new("a.txt").unwrap(),
            RepoPathBuf::new("a").unwrap(),
        ];
        paths.sort();
        let names: Vec<_> = paths.iter().map(RepoPathBuf::as_internal_str).collect();
        assert_eq!(names, vec!["a", "a.txt", "b"]);
    }
}
