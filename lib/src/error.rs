//! Error taxonomy shared by every core component.
//!
//! Each component defines its own `thiserror`-derived enum (mirroring the
//! split between `BackendError` and `IndexStoreError` upstream); this module
//! adds the top-level [`CoreError`] that every public entry point can
//! collapse into when a caller just wants "did it work".

use std::path::PathBuf;

use crate::object_id::ObjectHash;

/// Error raised by [`crate::object_codec`] while encoding or decoding an
/// object.
#[derive(Debug, thiserror::Error)]
pub enum ObjectCodecError {
    /// The leading type word (`blob`, `tree`, `commit`, `tag`) was not
    /// recognized.
    #[error("malformed object header: {0}")]
    MalformedHeader(String),
    /// No NUL terminator was found after the header.
    #[error("object header has no NUL terminator")]
    MissingNull,
    /// The declared payload length did not match the actual payload length.
    #[error("object size mismatch: header declared {declared}, payload is {actual}")]
    SizeMismatch {
        /// Length declared in the `<kind> <len>\0` header.
        declared: usize,
        /// Actual number of payload bytes found.
        actual: usize,
    },
    /// A commit had two `tree`, `author`, or `committer` lines.
    #[error("duplicate `{0}` header in commit object")]
    DuplicateField(&'static str),
    /// A commit header line began with a keyword that isn't recognized.
    #[error("unknown commit header field: {0}")]
    UnknownField(String),
    /// A commit was missing a required `author`/`committer`/`tree` line.
    #[error("commit is missing required `{0}` header")]
    MissingField(&'static str),
    /// An embedded hash was not 40 hex characters (or 20 raw bytes, for tree
    /// entries).
    #[error("invalid object hash: {0}")]
    InvalidHash(String),
    /// A tree entry had an invalid mode, empty name, or a name containing
    /// `/` or NUL.
    #[error("invalid tree entry: {0}")]
    InvalidTreeEntry(String),
    /// A `CommitPerson` name or email contained `<`, `>`, or a newline.
    #[error("invalid commit person line: {0}")]
    InvalidPerson(String),
}

/// Error raised by [`crate::object_store::ObjectStore`].
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// The store's `objects/` directory has not been created.
    #[error("object store at {0} is not initialized")]
    NotInitialized(PathBuf),
    /// A hash string was not 40 lowercase hex characters.
    #[error("invalid object hash format: {0:?}")]
    InvalidHashFormat(String),
    /// Reading, writing, or renaming a loose object file failed.
    #[error("I/O error in object store")]
    Io(#[source] std::io::Error),
    /// No loose object file exists at this hash's fan-out path. A normal,
    /// expected outcome for existence probing; distinct from [`Self::Corrupt`].
    #[error("object {0} not found")]
    NotFound(ObjectHash),
    /// A loose object file exists but failed to decompress, or its content
    /// hash did not match its storage path.
    #[error("corrupt object {0}")]
    Corrupt(ObjectHash),
    /// The stored bytes did not parse as a well-formed object.
    #[error(transparent)]
    Malformed(#[from] ObjectCodecError),
}

/// Error raised while reading, writing, or mutating a staging [`crate::index::Index`].
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The index file does not exist and no default was requested.
    #[error("index at {0} is not initialized")]
    NotInitialized(PathBuf),
    /// The header magic, version, or trailing checksum did not validate.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),
    /// An entry's path was absolute, contained `..`, or began with the
    /// reserved metadata directory name.
    #[error("unsafe path in index entry: {0:?}")]
    UnsafePath(String),
    /// Underlying I/O failure while reading or writing the index file.
    #[error("I/O error in index")]
    Io(#[source] std::io::Error),
}

/// Error raised by [`crate::tree_builder`] or [`crate::tree_walker`].
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A path segment both names a file and is a prefix of another entry's
    /// path (e.g. both `src` and `src/lib.rs` are staged as files).
    #[error("path conflict at {0:?}: segment is both a file and a directory")]
    PathConflict(String),
    /// Reading a tree object from the store failed.
    #[error(transparent)]
    Store(#[from] ObjectStoreError),
    /// A tree or commit object was malformed.
    #[error(transparent)]
    Codec(#[from] ObjectCodecError),
}

/// Error raised while acquiring a repository lock file.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("lock already held: {0}")]
    LockHeld(PathBuf),
    /// I/O failure while creating or removing the lock file.
    #[error("I/O error acquiring lock")]
    Io(#[source] std::io::Error),
}

/// Error raised while resolving or writing a ref.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    /// A symbolic ref chain exceeded the maximum hop count.
    #[error("symbolic ref resolution exceeded {0} hops")]
    TooManyHops(u32),
    /// A symbolic ref chain referred back to a ref already visited.
    #[error("symbolic ref cycle detected at {0:?}")]
    Cycle(String),
    /// The ref file did not contain a valid hash or `ref: <target>` line.
    #[error("malformed ref contents: {0:?}")]
    Malformed(String),
    /// The named ref does not exist.
    #[error("ref not found: {0:?}")]
    NotFound(String),
    /// I/O failure reading or writing a ref file.
    #[error("I/O error in ref store")]
    Io(#[source] std::io::Error),
    /// Failed to acquire `<ref>.lock`.
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Error raised by [`crate::workdir_sync::WorkdirSynchronizer`].
#[derive(Debug, thiserror::Error)]
pub enum WorkdirSyncError {
    /// Validation found files that differ from the index, or are missing.
    /// Returned only when `force` is false.
    #[error("working directory is dirty: {} modified, {} deleted", modified.len(), deleted.len())]
    DirtyWorkdir {
        /// Paths whose on-disk content differs from the staged blob.
        modified: Vec<String>,
        /// Paths present in the index but missing on disk.
        deleted: Vec<String>,
    },
    /// A create/modify operation's target path exists on disk as the wrong
    /// kind of entry (e.g. a directory where a file must go).
    #[error("path conflict applying operation at {0:?}")]
    PathConflict(String),
    /// An operation failed mid-execution. `rolled_back` is `false` only when
    /// the rollback attempt itself also failed, leaving the working
    /// directory in an inconsistent state that must be surfaced prominently.
    #[error(
        "transaction aborted at {failed_op:?} (rolled back: {rolled_back})"
    )]
    TransactionAborted {
        /// The path of the operation that failed.
        failed_op: String,
        /// Whether rollback of prior committed operations succeeded.
        rolled_back: bool,
        /// The underlying cause of the failed operation.
        #[source]
        cause: std::io::Error,
    },
    /// The caller's cancellation signal was observed between operations.
    /// Any already-committed operations have been rolled back.
    #[error("update cancelled")]
    Cancelled,
    /// Failed to acquire `index.lock`.
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Store(#[from] ObjectStoreError),
    /// Plain I/O failure not otherwise categorized above.
    #[error("I/O error during workdir synchronization")]
    Io(#[source] std::io::Error),
}

/// Umbrella error type for callers that don't need to match on a specific
/// component's error enum.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Codec(#[from] ObjectCodecError),
    #[error(transparent)]
    Store(#[from] ObjectStoreError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Ref(#[from] RefError),
    #[error(transparent)]
    WorkdirSync(#[from] WorkdirSyncError),
}
