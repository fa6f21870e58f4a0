//! Recursive enumeration of a tree's (or commit's) full file set.
//!
//! The inverse of [`crate::tree_builder`]: walks subtrees depth-first,
//! concatenating parent path and entry name with `/`, exactly mirroring how
//! `TreeBuilder` split paths on the way in.

use std::collections::BTreeMap;

use crate::error::TreeError;
use crate::object_id::ObjectHash;
use crate::object_store::ObjectStore;
use crate::objects::{FileMode, Object};

/// Every file reachable from a tree, keyed by its repository-relative
/// forward-slash path.
pub type FileMap = BTreeMap<String, (FileMode, ObjectHash)>;

/// Recursively walks the tree at `root_hash`, resolving nested subtrees.
///
/// Gitlink entries (submodules) are included as leaves — their hash is the
/// referenced commit, and the referenced repository is never recursed into.
pub fn walk_tree(store: &ObjectStore, root_hash: ObjectHash) -> Result<FileMap, TreeError> {
    let mut files = FileMap::new();
    walk_into(store, root_hash, "", &mut files)?;
    Ok(files)
}

fn walk_into(
    store: &ObjectStore,
    tree_hash: ObjectHash,
    prefix: &str,
    out: &mut FileMap,
) -> Result<(), TreeError> {
    let Object::Tree(tree) = store.read(tree_hash)? else {
        return Err(TreeError::Codec(crate::error::ObjectCodecError::MalformedHeader(
            format!("{tree_hash} is not a tree"),
        )));
    };
    for entry in tree.entries() {
        let name = String::from_utf8_lossy(entry.name());
        let path = if prefix.is_empty() {
            name.into_owned()
        } else {
            format!("{prefix}/{name}")
        };
        if entry.mode().is_dir() {
            walk_into(store, entry.hash(), &path, out)?;
        } else {
            out.insert(path, (entry.mode(), entry.hash()));
        }
    }
    Ok(())
}

/// Resolves `commit_hash` to its root tree and walks it.
pub fn commit_files(store: &ObjectStore, commit_hash: ObjectHash) -> Result<FileMap, TreeError> {
    let Object::Commit(commit) = store.read(commit_hash)? else {
        return Err(TreeError::Codec(crate::error::ObjectCodecError::MalformedHeader(
            format!("{commit_hash} is not a commit"),
        )));
    };
    walk_tree(store, commit.tree())
}

/// Compares two trees for equal file content, short-circuiting on equal
/// hashes before falling back to a full structural walk.
pub fn trees_identical(store: &ObjectStore, a: ObjectHash, b: ObjectHash) -> Result<bool, TreeError> {
    if a == b {
        return Ok(true);
    }
    Ok(walk_tree(store, a)? == walk_tree(store, b)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{EntryStat, Index, IndexEntry};
    use crate::repo_path::RepoPathBuf;
    use crate::tree_builder::build_tree_from_index;

    fn store_blob(store: &ObjectStore, content: &[u8]) -> ObjectHash {
        store.write(&Object::Blob(content.to_vec())).unwrap()
    }

    #[test]
    fn walks_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let mut index = Index::new();
        index.add(IndexEntry::new(
            RepoPathBuf::new("a.txt").unwrap(),
            FileMode::Regular,
            store_blob(&store, b"hi"),
            EntryStat::default(),
        ));
        index.add(IndexEntry::new(
            RepoPathBuf::new("d/b.txt").unwrap(),
            FileMode::Regular,
            store_blob(&store, b"bye"),
            EntryStat::default(),
        ));
        let root = build_tree_from_index(&index, &store).unwrap();
        let files = walk_tree(&store, root).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains_key("a.txt"));
        assert!(files.contains_key("d/b.txt"));
    }

    #[test]
    fn trees_identical_short_circuits_on_equal_hash() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let empty = build_tree_from_index(&Index::new(), &store).unwrap();
        assert!(trees_identical(&store, empty, empty).unwrap());
    }

    #[test]
    fn trees_identical_compares_structurally() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();

        let mut first = Index::new();
        first.add(IndexEntry::new(
            RepoPathBuf::new("a.txt").unwrap(),
            FileMode::Regular,
            store_blob(&store, b"same"),
            EntryStat::default(),
        ));
        let first_root = build_tree_from_index(&first, &store).unwrap();

        let mut second = Index::new();
        second.add(IndexEntry::new(
            RepoPathBuf::new("b.txt").unwrap(),
            FileMode::Regular,
            store_blob(&store, b"same"),
            EntryStat::default(),
        ));
        let second_root = build_tree_from_index(&second, &store).unwrap();

        assert_ne!(first_root, second_root);
        assert!(!trees_identical(&store, first_root, second_root).unwrap());
    }
}
