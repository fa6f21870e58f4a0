//! On-disk repository layout: where the metadata directory, object store,
//! index, and refs hierarchy live relative to the repository root.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, IndexError};
use crate::index::Index;
use crate::object_store::ObjectStore;
use crate::refs;

/// Default name of the metadata directory, analogous to Git's `.git`.
pub const DEFAULT_METADATA_DIR_NAME: &str = ".source";

/// Resolves the paths that make up a repository's metadata directory. The
/// directory name is configurable (see the Open Question on `core.ignorecase`
/// et al. — nothing here hardcodes `.git`), but the internal structure below
/// it is Git's.
#[derive(Debug, Clone)]
pub struct RepoLayout {
    repo_root: PathBuf,
    metadata_dir_name: String,
}

impl RepoLayout {
    /// Describes a repository rooted at `repo_root`, with a metadata
    /// directory named `metadata_dir_name` (pass [`DEFAULT_METADATA_DIR_NAME`]
    /// for the default).
    pub fn new(repo_root: impl Into<PathBuf>, metadata_dir_name: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            metadata_dir_name: metadata_dir_name.into(),
        }
    }

    /// The repository's working directory root.
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// The name of the reserved metadata directory (e.g. `".source"`).
    pub fn metadata_dir_name(&self) -> &str {
        &self.metadata_dir_name
    }

    /// The metadata directory itself.
    pub fn metadata_dir(&self) -> PathBuf {
        self.repo_root.join(&self.metadata_dir_name)
    }

    /// The `HEAD` file.
    pub fn head_path(&self) -> PathBuf {
        self.metadata_dir().join("HEAD")
    }

    /// The `config` file.
    pub fn config_path(&self) -> PathBuf {
        self.metadata_dir().join("config")
    }

    /// The `description` file.
    pub fn description_path(&self) -> PathBuf {
        self.metadata_dir().join("description")
    }

    /// The `index` file.
    pub fn index_path(&self) -> PathBuf {
        self.metadata_dir().join("index")
    }

    /// The `objects/` directory.
    pub fn objects_dir(&self) -> PathBuf {
        self.metadata_dir().join("objects")
    }

    /// The `refs/heads/` directory.
    pub fn refs_heads_dir(&self) -> PathBuf {
        self.metadata_dir().join("refs").join("heads")
    }

    /// The `refs/tags/` directory.
    pub fn refs_tags_dir(&self) -> PathBuf {
        self.metadata_dir().join("refs").join("tags")
    }

    /// Opens the object store rooted at this layout's `objects/` directory.
    pub fn object_store(&self) -> ObjectStore {
        ObjectStore::new(self.objects_dir())
    }

    /// Reads the staging index, treating a missing file as empty (the
    /// common case right after [`Self::initialize`]).
    ///
    /// [`Index::read`] itself only knows the path-safety rules that apply
    /// everywhere (no `..`, nothing absolute); rejecting a path that begins
    /// with this repository's own metadata directory name is specific to a
    /// given [`RepoLayout`], so it's enforced here rather than in
    /// [`crate::index`] itself.
    pub fn read_index(&self) -> Result<Index, IndexError> {
        let index = match Index::read(&self.index_path()) {
            Ok(index) => index,
            Err(IndexError::NotInitialized(_)) => return Ok(Index::new()),
            Err(e) => return Err(e),
        };
        for entry in index.entries() {
            crate::repo_path::RepoPathBuf::new_checked_against_metadata_dir(
                entry.path().as_internal_str(),
                &self.metadata_dir_name,
            )
            .map_err(|e| IndexError::UnsafePath(e.0))?;
        }
        Ok(index)
    }

    /// Resolves `HEAD` to a commit hash.
    pub fn read_head(&self) -> Result<crate::object_id::ObjectHash, CoreError> {
        refs::read_head(&self.metadata_dir()).map_err(CoreError::from)
    }

    /// Creates a fresh, empty repository at this layout: `objects/`,
    /// `refs/heads/`, `refs/tags/`, an empty `description`, and `HEAD`
    /// pointing symbolically at `refs/heads/<default_branch>`.
    pub fn initialize(&self, default_branch: &str) -> Result<(), CoreError> {
        let meta = self.metadata_dir();
        fs::create_dir_all(&meta).map_err(crate::error::ObjectStoreError::Io)?;
        ObjectStore::initialize(self.objects_dir())?;
        fs::create_dir_all(self.refs_heads_dir()).map_err(crate::error::ObjectStoreError::Io)?;
        fs::create_dir_all(self.refs_tags_dir()).map_err(crate::error::ObjectStoreError::Io)?;
        if !self.description_path().is_file() {
            fs::write(
                self.description_path(),
                "Unnamed repository; edit this file to name it for gitweb.\n",
            )
            .map_err(crate::error::ObjectStoreError::Io)?;
        }
        refs::write_symbolic_ref(&meta, &format!("refs/heads/{default_branch}"))?;
        Ok(())
    }
}
