//! Folds a flat [`crate::index::Index`] into a recursive tree-of-trees.
//!
//! The grouping algorithm is adapted from `jj-lib`'s `TreeBuilder::write_tree`:
//! gather every directory that needs a tree object into a `BTreeMap` keyed by
//! its repository path, then pop entries off in reverse lexicographic order
//! so that every child directory is written (and its hash folded into the
//! parent's pending entries) before its parent is reached. A path sorts
//! after all of its descendants only when compared as a prefix with no
//! trailing separator, so directories are deliberately keyed without a
//! trailing slash here; the reverse-iteration order still visits the
//! deepest paths first because `a/b` sorts after `a`.

use std::collections::BTreeMap;

use crate::error::TreeError;
use crate::index::Index;
use crate::object_store::ObjectStore;
use crate::objects::{FileMode, Object, Tree, TreeEntry};
use crate::repo_path::RepoPathBuf;

/// Builds every intermediate tree object implied by `index`'s stage-0
/// entries and writes them to `store`, returning the root tree's hash.
pub fn build_tree_from_index(index: &Index, store: &ObjectStore) -> Result<crate::object_id::ObjectHash, TreeError> {
    let mut pending: BTreeMap<RepoPathBuf, BTreeMap<String, (FileMode, crate::object_id::ObjectHash)>> =
        BTreeMap::new();
    pending.entry(RepoPathBuf::root()).or_default();

    for entry in index.entries() {
        if entry.stage() != crate::index::Stage::NORMAL {
            continue;
        }
        let path = entry.path();
        let Some((dir, basename)) = path.split() else {
            // The root itself can never be a staged path.
            continue;
        };
        ensure_ancestors(&mut pending, &dir);
        let siblings = pending.entry(dir).or_default();
        if siblings.contains_key(basename) {
            return Err(TreeError::PathConflict(path.as_internal_str().to_string()));
        }
        siblings.insert(basename.to_string(), (entry.mode(), entry.hash()));
    }

    while let Some((dir, children)) = pending.pop_last() {
        let is_empty = children.is_empty();
        let mut tree_entries = Vec::with_capacity(children.len());
        for (name, (mode, hash)) in children {
            tree_entries
                .push(TreeEntry::new(mode, name.into_bytes(), hash).map_err(TreeError::Codec)?);
        }
        let tree = Tree::from_entries(tree_entries).map_err(TreeError::Codec)?;

        match dir.split() {
            Some((parent, basename)) => {
                // A directory that ends up with no children (every entry
                // that would have lived under it was itself an empty
                // subdirectory, recursively) is never emitted.
                if is_empty {
                    continue;
                }
                let parent_entries = pending.get_mut(&parent).expect("ancestors are pre-populated");
                if let Some((existing_mode, _)) = parent_entries.get(basename) {
                    if *existing_mode != FileMode::Tree {
                        return Err(TreeError::PathConflict(
                            dir.as_internal_str().to_string(),
                        ));
                    }
                }
                let hash = store.write(&Object::Tree(tree))?;
                let parent_entries = pending.get_mut(&parent).expect("ancestors are pre-populated");
                parent_entries.insert(basename.to_string(), (FileMode::Tree, hash));
            }
            None => {
                let hash = store.write(&Object::Tree(tree))?;
                return Ok(hash);
            }
        }
    }

    unreachable!("the root directory is always present in `pending`")
}

fn ensure_ancestors(
    pending: &mut BTreeMap<RepoPathBuf, BTreeMap<String, (FileMode, crate::object_id::ObjectHash)>>,
    dir: &RepoPathBuf,
) {
    let mut current = dir.clone();
    loop {
        if pending.contains_key(&current) {
            return;
        }
        pending.entry(current.clone()).or_default();
        match current.parent() {
            Some(parent) => current = parent,
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{EntryStat, IndexEntry};
    use crate::tree_walker::walk_tree;

    fn blob_entry(store: &ObjectStore, path: &str, content: &[u8]) -> IndexEntry {
        let hash = store.write(&Object::Blob(content.to_vec())).unwrap();
        IndexEntry::new(
            RepoPathBuf::new(path).unwrap(),
            FileMode::Regular,
            hash,
            EntryStat::default(),
        )
    }

    #[test]
    fn empty_index_produces_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let hash = build_tree_from_index(&Index::new(), &store).unwrap();
        assert_eq!(hash.hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn deep_nesting_round_trips_through_tree_walker() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let mut index = Index::new();
        index.add(blob_entry(&store, "x/y/z/w/file.txt", b"deep"));
        let root = build_tree_from_index(&index, &store).unwrap();

        let files = walk_tree(&store, root).unwrap();
        assert_eq!(files.len(), 1);
        let (mode, hash) = files.get("x/y/z/w/file.txt").unwrap();
        assert_eq!(*mode, FileMode::Regular);
        let blob = store.read(*hash).unwrap();
        assert_eq!(blob, Object::Blob(b"deep".to_vec()));
    }

    #[test]
    fn sibling_dir_and_file_with_same_basename_sort_file_first() {
        // Mirrors Git's base_name_compare: "a.txt" (file) sorts before "a/"
        // (directory), since '.' (0x2e) < the directory's implied '/' (0x2f).
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let mut index = Index::new();
        index.add(blob_entry(&store, "a.txt", b"file"));
        index.add(blob_entry(&store, "a/inner", b"inner"));
        let root = build_tree_from_index(&index, &store).unwrap();
        let Object::Tree(tree) = store.read(root).unwrap() else {
            panic!("expected tree");
        };
        let names: Vec<_> = tree.entries().iter().map(|e| e.name().to_vec()).collect();
        assert_eq!(names, vec![b"a.txt".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn file_and_directory_prefix_conflict_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let mut index = Index::new();
        index.add(blob_entry(&store, "src", b"file"));
        index.add(blob_entry(&store, "src/lib.rs", b"code"));
        // Both "src" as a file and "src" as a directory prefix collide at
        // the same basename within the root tree's pending entries.
        let err = build_tree_from_index(&index, &store);
        assert!(err.is_err());
    }

    #[test]
    fn determinism_is_independent_of_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();

        let mut first = Index::new();
        first.add(blob_entry(&store, "a.txt", b"1"));
        first.add(blob_entry(&store, "b/c.txt", b"2"));
        let hash_a = build_tree_from_index(&first, &store).unwrap();

        let mut second = Index::new();
        second.add(blob_entry(&store, "b/c.txt", b"2"));
        second.add(blob_entry(&store, "a.txt", b"1"));
        let hash_b = build_tree_from_index(&second, &store).unwrap();

        assert_eq!(hash_a, hash_b);
    }
}
