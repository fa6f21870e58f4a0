//! Fixture helpers shared by `lode-core`'s integration tests.
//!
//! Mirrors the shape of `jj-lib`'s own `testutils` crate: a handful of small,
//! composable builders for a temp-directory repository, rather than one
//! monolithic test harness. Nothing here is published; it only exists to keep
//! `lib/tests/*.rs` free of repeated boilerplate.

use std::fs;
use std::path::Path;

use lode_core::index::{EntryStat, Index, IndexEntry};
use lode_core::layout::{RepoLayout, DEFAULT_METADATA_DIR_NAME};
use lode_core::object_id::ObjectHash;
use lode_core::object_store::ObjectStore;
use lode_core::objects::{Commit, CommitPerson, FileMode, Object};
use lode_core::repo_path::RepoPathBuf;
use lode_core::tree_builder::build_tree_from_index;
use tempfile::TempDir;

/// A freshly initialized repository in a temp directory, kept alive for the
/// duration of a test.
pub struct TestRepo {
    _dir: TempDir,
    pub layout: RepoLayout,
}

impl TestRepo {
    /// Creates an empty, initialized repository under a new temp directory.
    pub fn init() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("lode-core-test-")
            .tempdir()
            .expect("failed to create temp dir");
        let layout = RepoLayout::new(dir.path(), DEFAULT_METADATA_DIR_NAME);
        layout.initialize("main").expect("failed to initialize repo");
        Self { _dir: dir, layout }
    }

    /// The working directory root.
    pub fn root(&self) -> &Path {
        self.layout.repo_root()
    }

    /// The repository's object store.
    pub fn store(&self) -> ObjectStore {
        self.layout.object_store()
    }
}

/// A `(path, content)` pair describing a file to stage, for
/// [`commit_with_files`].
pub type FileSpec<'a> = (&'a str, &'a [u8]);

/// Stages `files` into a fresh index, builds the implied tree, and writes a
/// commit object on top of it with a fixed, deterministic author/committer
/// (test output should never depend on wall-clock time).
pub fn commit_with_files(store: &ObjectStore, parents: Vec<ObjectHash>, files: &[FileSpec<'_>]) -> ObjectHash {
    let mut index = Index::new();
    for (path, content) in files {
        let hash = store
            .write(&Object::Blob(content.to_vec()))
            .expect("writing a blob cannot fail in a freshly initialized store");
        index.add(IndexEntry::new(
            RepoPathBuf::new(*path).expect("test fixture paths are always valid"),
            FileMode::Regular,
            hash,
            EntryStat::default(),
        ));
    }
    let tree = build_tree_from_index(&index, store).expect("test fixture trees never conflict");
    let person = test_person();
    let commit = Commit::new(tree, parents, person.clone(), person, "test commit\n");
    store
        .write(&Object::Commit(commit))
        .expect("writing a commit cannot fail in a freshly initialized store")
}

/// A stable author/committer identity for deterministic test fixtures.
pub fn test_person() -> CommitPerson {
    CommitPerson::new("Test User", "test.user@example.com", 0, 0)
        .expect("fixture author is always well-formed")
}

/// Writes `content` directly to `path` under the repo root, creating parent
/// directories as needed. For tests that need to poke the working directory
/// out-of-band of a checkout (e.g. to simulate a dirty workdir).
pub fn write_workdir_file(repo: &TestRepo, path: &str, content: &[u8]) {
    let full = repo.root().join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).expect("failed to create parent directory");
    }
    fs::write(full, content).expect("failed to write workdir file");
}
