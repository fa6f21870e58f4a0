//! `lode-core`: the content-addressed object store, tree/commit/blob object
//! model, staging index, and atomic working-directory synchronizer for a
//! Git-compatible source control system.
//!
//! This crate deliberately does not implement interactive terminal
//! presentation, argument parsing and command dispatch, high-level diff
//! algorithms, branch/ref name policy, configuration *file* parsing, or
//! ignore-pattern matching — those are external collaborators that consume
//! this crate through the narrow interfaces in [`config`]. Nor does it
//! implement remote network protocols, the pack-file format, signature
//! verification, reflog, or submodule checkout beyond recording a gitlink
//! entry (see [`objects::FileMode::Gitlink`]).
//!
//! The five cooperating components, leaves-first:
//!
//! - [`objects`] — the `ObjectCodec`: canonical bytes ↔ typed [`objects::Object`].
//! - [`object_store`] — the `ObjectStore`: durable, content-addressed, loose
//!   object storage.
//! - [`index`] — the staging `Index`: Git's DIRC binary format.
//! - [`tree_builder`] and [`tree_walker`] — folding a flat index into a
//!   recursive tree, and the inverse walk.
//! - [`workdir_sync`] — the `WorkdirSynchronizer`: the transactional checkout
//!   pipeline that brings the working directory and index to match a target
//!   commit.
//!
//! [`layout`] and [`refs`] tie these into an on-disk repository shape
//! compatible with Git's own `.git` layout (under a configurable directory
//! name), and [`lock`] provides the advisory locking both the index and refs
//! rely on for concurrent-mutation safety.

pub mod config;
pub mod error;
mod hex_util;
pub mod index;
pub mod layout;
pub mod lock;
pub mod object_id;
pub mod object_store;
pub mod objects;
pub mod refs;
pub mod repo_path;
pub mod tree_builder;
pub mod tree_walker;
pub mod workdir_sync;

pub use error::CoreError;
pub use object_id::ObjectHash;
pub use objects::{Commit, CommitPerson, FileMode, Object, Tag, Tree, TreeEntry};
