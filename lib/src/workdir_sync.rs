//! Atomically synchronizes the working directory and staging index to a
//! target commit.
//!
//! This is the component with the widest blast radius in the crate: it is
//! the only one that mutates user files. The execution phase borrows its
//! crash-safety shape from [`crate::object_store::ObjectStore`] and
//! [`crate::index::Index`] (write-temp, fsync, rename), but additionally
//! keeps an explicit backup stack so a failure partway through a multi-file
//! checkout can be undone — a concern neither of those simpler stores has,
//! since their writes are single-file and idempotent.
//!
//! The two independent reads change analysis needs (the current index, and
//! the target commit's file set) are run concurrently with
//! `std::thread::scope`, mirroring the "two joinable tasks with a single
//! error-propagation point" design this crate's async-free core chose in
//! place of an async fan-out.

use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use itertools::{EitherOrBoth, Itertools as _};

use crate::config::{self, IgnoreFilter};
use crate::error::WorkdirSyncError;
use crate::index::{EntryStat, Index, IndexEntry, Stage};
use crate::layout::RepoLayout;
use crate::lock::{lock_path_for, LockFile};
use crate::object_id::ObjectHash;
use crate::object_store::ObjectStore;
use crate::objects::{FileMode, Object};
use crate::repo_path::RepoPathBuf;
use crate::tree_walker::{self, FileMap};

/// Caller-supplied knobs for [`update_to_commit`].
#[derive(Default)]
pub struct UpdateOptions {
    /// Skip the dirty-working-directory safety check and overwrite local
    /// modifications.
    pub force: bool,
    /// Classify planned operations without touching the working directory.
    pub dry_run: bool,
    /// Excludes matching paths from the dirty-working-directory check; a
    /// path occupying a planned create's target is only treated as unsafe
    /// to overwrite when this predicate does not already exclude it.
    /// Defaults to [`config::NoIgnores`] (nothing excluded) when absent.
    pub ignore: Option<Box<dyn IgnoreFilter>>,
    /// Invoked once per applied operation, after it commits.
    pub progress: Option<Box<dyn FnMut(&Operation)>>,
    /// Polled between operations; returning `true` aborts the remaining
    /// plan and rolls back everything committed so far.
    pub cancel: Option<Box<dyn Fn() -> bool>>,
}

impl std::fmt::Debug for UpdateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateOptions")
            .field("force", &self.force)
            .field("dry_run", &self.dry_run)
            .field("ignore", &self.ignore.is_some())
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// One file-level change between the current index and the target commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// The path exists in the target but not in the current index.
    Create {
        /// The path to create.
        path: RepoPathBuf,
        /// The mode to create it with.
        mode: FileMode,
        /// The blob (or gitlink commit) hash providing its content.
        hash: ObjectHash,
    },
    /// The path exists in both, with a different hash or mode.
    Modify {
        /// The path to rewrite.
        path: RepoPathBuf,
        /// The new mode.
        mode: FileMode,
        /// The new content hash.
        hash: ObjectHash,
    },
    /// The path exists in the current index but not in the target.
    Delete {
        /// The path to remove.
        path: RepoPathBuf,
    },
}

impl Operation {
    /// The path this operation acts on.
    pub fn path(&self) -> &RepoPathBuf {
        match self {
            Self::Create { path, .. } | Self::Modify { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// A planned [`Operation`] together with any conflict a dry run detected
/// that would prevent it from applying cleanly.
#[derive(Debug, Clone)]
pub struct PlannedOperation {
    /// The operation as it would execute.
    pub operation: Operation,
    /// Set if applying this operation would fail (e.g. a create whose
    /// target path exists on disk as the wrong kind of entry).
    pub conflict: Option<String>,
}

/// The result of a `dry_run: true` update: what would happen, with no
/// mutation performed.
#[derive(Debug)]
pub struct DryRunReport {
    /// Every planned operation and its conflict status, if any.
    pub operations: Vec<PlannedOperation>,
}

/// Whether the post-execution index rewrite succeeded. Per the contract,
/// a failure here does not make the overall update unsuccessful: the
/// working directory is already correct, which is the invariant that
/// matters.
#[derive(Debug)]
pub enum IndexRewriteReport {
    /// The index was rewritten to match the new working directory state.
    Written,
    /// The working directory was updated, but writing the new index back
    /// out failed. The caller should treat the index as stale and prompt
    /// for repair.
    Failed(String),
}

/// The outcome of a successfully applied (non-dry-run) update.
#[derive(Debug)]
pub struct UpdateReport {
    /// Operations applied, in the order they committed.
    pub operations: Vec<Operation>,
    /// Number of files actually changed on disk (creates + modifies +
    /// deletes).
    pub files_changed: usize,
    /// Whether the subsequent index rewrite succeeded.
    pub index_report: IndexRewriteReport,
}

/// Either a plan was applied, or a dry run classified it without touching
/// anything.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The plan executed.
    Applied(UpdateReport),
    /// `dry_run` was requested; this is what would have happened.
    DryRun(DryRunReport),
}

/// Brings the working directory and index at `layout` to match
/// `commit_hash`, per the pipeline described in this module's docs.
pub fn update_to_commit(
    layout: &RepoLayout,
    commit_hash: ObjectHash,
    mut options: UpdateOptions,
) -> Result<UpdateOutcome, WorkdirSyncError> {
    let _span = tracing::info_span!("update_to_commit", commit = %commit_hash).entered();

    let lock_path = lock_path_for(&layout.index_path());
    let _lock = LockFile::acquire(lock_path)?;

    let store = layout.object_store();
    let repo_root = layout.repo_root();

    let (current_index, target_files) = analyze_concurrently(layout, &store, commit_hash)?;

    if !options.force {
        let ignore = options.ignore.as_deref().unwrap_or(&config::NoIgnores);
        validate_clean(repo_root, &current_index, &target_files, ignore)?;
    }

    let operations = plan_operations(&current_index, &target_files);

    if options.dry_run {
        let planned = operations
            .into_iter()
            .map(|op| {
                let conflict = detect_conflict(repo_root, &op);
                PlannedOperation { operation: op, conflict }
            })
            .collect();
        return Ok(UpdateOutcome::DryRun(DryRunReport { operations: planned }));
    }

    let applied = execute_plan(repo_root, &store, operations, &mut options)?;
    let files_changed = applied.len();
    tracing::debug!(files_changed, "applied checkout plan");

    let index_report = match rebuild_index(layout, &target_files) {
        Ok(()) => IndexRewriteReport::Written,
        Err(e) => IndexRewriteReport::Failed(e.to_string()),
    };

    Ok(UpdateOutcome::Applied(UpdateReport {
        operations: applied,
        files_changed,
        index_report,
    }))
}

/// Compares the current index against the working directory, and also
/// checks every path the update would newly create against what's already
/// on disk; returns [`WorkdirSyncError::DirtyWorkdir`] if anything differs.
///
/// A path a caller's `ignore` predicate excludes is never reported: an
/// ignored file sitting in the way of a create is treated the same way Git
/// treats an ignored file clobbered by checkout, not as user data at risk.
fn validate_clean(
    repo_root: &Path,
    index: &Index,
    target_files: &FileMap,
    ignore: &dyn IgnoreFilter,
) -> Result<(), WorkdirSyncError> {
    let mut modified = Vec::new();
    let mut deleted = Vec::new();
    let mut staged = std::collections::BTreeSet::new();

    for entry in index.entries() {
        if entry.stage() != Stage::NORMAL {
            continue;
        }
        staged.insert(entry.path().as_internal_str());
        let disk_path = repo_root.join(entry.path().as_internal_str());
        match fs::symlink_metadata(&disk_path) {
            Ok(metadata) => {
                if !is_unchanged(entry, &metadata, &disk_path)? {
                    modified.push(entry.path().as_internal_str().to_string());
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                deleted.push(entry.path().as_internal_str().to_string());
            }
            Err(e) => return Err(WorkdirSyncError::Io(e)),
        }
    }

    // A path absent from the current index but present in the target commit
    // is a planned create; if something already occupies it on disk, that's
    // dirty state exactly as much as a modified tracked file, and must be
    // caught here rather than silently overwritten during execution.
    for path in target_files.keys() {
        if staged.contains(path.as_str()) || ignore.is_ignored(path, false) {
            continue;
        }
        let disk_path = repo_root.join(path);
        if fs::symlink_metadata(&disk_path).is_ok() {
            modified.push(path.clone());
        }
    }
    modified.sort();

    if modified.is_empty() && deleted.is_empty() {
        Ok(())
    } else {
        Err(WorkdirSyncError::DirtyWorkdir { modified, deleted })
    }
}

/// Stat-based fast path first (size and mtime, mirroring how real Git
/// avoids rereading unchanged files), falling back to a full content hash
/// comparison only when the stat data is ambiguous or has changed.
fn is_unchanged(entry: &IndexEntry, metadata: &fs::Metadata, disk_path: &Path) -> Result<bool, WorkdirSyncError> {
    let stat = entry.stat();
    let len_known = stat.size != u32::MAX;
    let len_matches = metadata.len() <= u32::MAX as u64 && metadata.len() as u32 == stat.size;
    let mtime_matches = mtime_seconds(metadata) == stat.mtime.0;

    if len_known && len_matches && mtime_matches {
        return Ok(true);
    }

    let content = fs::read(disk_path).map_err(WorkdirSyncError::Io)?;
    let disk_hash = Object::Blob(content).hash();
    Ok(disk_hash == entry.hash())
}

#[cfg(unix)]
fn mtime_seconds(metadata: &fs::Metadata) -> u32 {
    metadata.mtime() as u32
}

/// No POSIX mtime outside Unix; falls back to the portable `modified()`
/// timestamp, which is coarser (whole-second Unix epoch only).
#[cfg(not(unix))]
fn mtime_seconds(metadata: &fs::Metadata) -> u32 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Reads the current index and walks the target commit's tree concurrently;
/// a failure in either is the single propagation point for both.
fn analyze_concurrently(
    layout: &RepoLayout,
    store: &ObjectStore,
    commit_hash: ObjectHash,
) -> Result<(Index, FileMap), WorkdirSyncError> {
    std::thread::scope(|scope| {
        let index_task = scope.spawn(|| layout.read_index().map_err(WorkdirSyncError::from));
        let tree_task = scope.spawn(|| {
            tree_walker::commit_files(store, commit_hash).map_err(WorkdirSyncError::from)
        });

        let index = index_task.join().expect("index read thread panicked")?;
        let files = tree_task.join().expect("tree walk thread panicked")?;
        Ok((index, files))
    })
}

fn plan_operations(current_index: &Index, target_files: &FileMap) -> Vec<Operation> {
    let current: std::collections::BTreeMap<String, (FileMode, ObjectHash)> = current_index
        .entries()
        .iter()
        .filter(|e| e.stage() == Stage::NORMAL)
        .map(|e| (e.path().as_internal_str().to_string(), (e.mode(), e.hash())))
        .collect();

    current
        .into_iter()
        .merge_join_by(target_files.iter(), |(a, _), (b, _)| a.as_str().cmp(b.as_str()))
        .filter_map(|either| match either {
            EitherOrBoth::Left((path, _)) => Some(Operation::Delete {
                path: RepoPathBuf::new(path).expect("index paths are already validated"),
            }),
            EitherOrBoth::Right((path, (mode, hash))) => Some(Operation::Create {
                path: RepoPathBuf::new(path.clone()).expect("tree-walked paths are already validated"),
                mode: *mode,
                hash: *hash,
            }),
            EitherOrBoth::Both((path, (old_mode, old_hash)), (_, (new_mode, new_hash))) => {
                if old_mode == *new_mode && old_hash == *new_hash {
                    None
                } else {
                    Some(Operation::Modify {
                        path: RepoPathBuf::new(path).expect("index paths are already validated"),
                        mode: *new_mode,
                        hash: *new_hash,
                    })
                }
            }
        })
        .collect()
}

fn detect_conflict(repo_root: &Path, op: &Operation) -> Option<String> {
    let disk_path = repo_root.join(op.path().as_internal_str());
    match op {
        Operation::Create { .. } => {
            if let Some(conflict) = ancestor_file_conflict(repo_root, &disk_path) {
                return Some(conflict);
            }
            match fs::symlink_metadata(&disk_path) {
                Ok(metadata) if metadata.is_dir() => {
                    Some(format!("{} exists on disk as a directory", op.path()))
                }
                _ => None,
            }
        }
        Operation::Modify { .. } | Operation::Delete { .. } => None,
    }
}

/// Walks `disk_path`'s ancestors up to (not including) `repo_root`, looking
/// for one that already exists as a non-directory — the "or vice versa"
/// case of a create conflict, where a path segment above the target blocks
/// the `mkdir -p` execution would otherwise perform.
fn ancestor_file_conflict(repo_root: &Path, disk_path: &Path) -> Option<String> {
    let mut dir = disk_path.parent();
    while let Some(d) = dir {
        if d == repo_root || !d.starts_with(repo_root) {
            break;
        }
        if let Ok(metadata) = fs::symlink_metadata(d) {
            if !metadata.is_dir() {
                return Some(format!(
                    "{} exists on disk as a file, blocking directory creation",
                    d.display()
                ));
            }
        }
        dir = d.parent();
    }
    None
}

/// What a file looked like before an operation touched it, so it can be put
/// back if a later operation in the same plan fails.
enum Backup {
    Absent,
    Existed { contents: BackupContents, mode: u32 },
}

enum BackupContents {
    Regular(Vec<u8>),
    Symlink(PathBuf),
}

fn capture_backup(disk_path: &Path) -> io::Result<Backup> {
    match fs::symlink_metadata(disk_path) {
        Ok(metadata) => {
            let mode = file_mode_bits(&metadata);
            let contents = if metadata.file_type().is_symlink() {
                BackupContents::Symlink(fs::read_link(disk_path)?)
            } else {
                BackupContents::Regular(fs::read(disk_path)?)
            };
            Ok(Backup::Existed { contents, mode })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Backup::Absent),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn file_mode_bits(metadata: &fs::Metadata) -> u32 {
    metadata.permissions().mode()
}

/// Permission bits are a POSIX concept; nothing to capture on other
/// platforms, so restoring a backup there never touches permissions.
#[cfg(not(unix))]
fn file_mode_bits(_metadata: &fs::Metadata) -> u32 {
    0
}

#[cfg(unix)]
fn set_file_mode_bits(disk_path: &Path, mode: u32) -> io::Result<()> {
    fs::set_permissions(disk_path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_file_mode_bits(_disk_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks are not supported on this platform"))
}

fn restore_backup(disk_path: &Path, backup: &Backup) -> io::Result<()> {
    match backup {
        Backup::Absent => {
            if fs::symlink_metadata(disk_path).is_ok() {
                remove_path(disk_path)?;
            }
            Ok(())
        }
        Backup::Existed { contents, mode } => {
            remove_path_if_present(disk_path)?;
            if let Some(dir) = disk_path.parent() {
                fs::create_dir_all(dir)?;
            }
            match contents {
                BackupContents::Regular(bytes) => {
                    fs::write(disk_path, bytes)?;
                    set_file_mode_bits(disk_path, *mode)?;
                }
                BackupContents::Symlink(target) => {
                    create_symlink(target, disk_path)?;
                }
            }
            Ok(())
        }
    }
}

fn remove_path(disk_path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(disk_path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(disk_path)
    } else {
        fs::remove_file(disk_path)
    }
}

fn remove_path_if_present(disk_path: &Path) -> io::Result<()> {
    match remove_path(disk_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Applies `operations` one at a time, keeping a backup stack so any
/// mid-plan failure (or observed cancellation) can be fully undone.
fn execute_plan(
    repo_root: &Path,
    store: &ObjectStore,
    operations: Vec<Operation>,
    options: &mut UpdateOptions,
) -> Result<Vec<Operation>, WorkdirSyncError> {
    let mut backups: Vec<(PathBuf, Backup)> = Vec::with_capacity(operations.len());
    let mut committed = Vec::with_capacity(operations.len());

    for operation in operations {
        if let Some(cancel) = &options.cancel {
            if cancel() {
                rollback(&backups)?;
                return Err(WorkdirSyncError::Cancelled);
            }
        }

        let disk_path = repo_root.join(operation.path().as_internal_str());
        let backup = match capture_backup(&disk_path) {
            Ok(b) => b,
            Err(e) => {
                let rolled_back = rollback(&backups).is_ok();
                return Err(WorkdirSyncError::TransactionAborted {
                    failed_op: operation.path().as_internal_str().to_string(),
                    rolled_back,
                    cause: e,
                });
            }
        };

        match apply_operation(repo_root, store, &operation) {
            Ok(()) => {
                backups.push((disk_path, backup));
                if let Some(progress) = &mut options.progress {
                    progress(&operation);
                }
                committed.push(operation);
            }
            Err(e) => {
                let rolled_back = rollback(&backups).is_ok();
                return Err(WorkdirSyncError::TransactionAborted {
                    failed_op: operation.path().as_internal_str().to_string(),
                    rolled_back,
                    cause: e,
                });
            }
        }
    }

    Ok(committed)
}

fn rollback(backups: &[(PathBuf, Backup)]) -> io::Result<()> {
    for (disk_path, backup) in backups.iter().rev() {
        restore_backup(disk_path, backup)?;
    }
    Ok(())
}

fn apply_operation(repo_root: &Path, store: &ObjectStore, operation: &Operation) -> io::Result<()> {
    match operation {
        Operation::Delete { path } => {
            let disk_path = repo_root.join(path.as_internal_str());
            remove_path_if_present(&disk_path)?;
            remove_empty_ancestors(repo_root, &disk_path);
            Ok(())
        }
        Operation::Create { path, mode, hash } | Operation::Modify { path, mode, hash } => {
            let disk_path = repo_root.join(path.as_internal_str());
            if let Some(dir) = disk_path.parent() {
                fs::create_dir_all(dir)?;
            }
            remove_path_if_present(&disk_path)?;
            write_entry_to_disk(store, &disk_path, *mode, *hash)
        }
    }
}

fn write_entry_to_disk(store: &ObjectStore, disk_path: &Path, mode: FileMode, hash: ObjectHash) -> io::Result<()> {
    let object = store
        .read(hash)
        .map_err(|e| io::Error::other(e.to_string()))?;
    let Object::Blob(content) = object else {
        return Err(io::Error::other(format!("{hash} is not a blob")));
    };

    let dir = disk_path.parent().expect("disk_path always has a parent under repo_root");
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    use std::io::Write as _;

    if mode == FileMode::Symlink {
        let target = String::from_utf8_lossy(&content).into_owned();
        drop(temp);
        match create_symlink(Path::new(&target), disk_path) {
            Ok(()) => return Ok(()),
            Err(e) => {
                // Symlink creation failed (e.g. missing privilege, or no
                // platform support): degrade to a regular file containing
                // the link target, as the checkout contract allows.
                tracing::warn!(path = %disk_path.display(), error = %e, "symlink creation failed, writing plain file");
                fs::write(disk_path, target.as_bytes())?;
                return Ok(());
            }
        }
    }

    temp.write_all(&content)?;
    temp.as_file().sync_data()?;
    let file = temp.persist(disk_path).map_err(|e| e.error)?;
    set_regular_file_mode(&file, mode)?;
    Ok(())
}

#[cfg(unix)]
fn set_regular_file_mode(file: &fs::File, mode: FileMode) -> io::Result<()> {
    let bits = if mode == FileMode::Executable { 0o755 } else { 0o644 };
    file.set_permissions(fs::Permissions::from_mode(bits))
}

/// The executable bit has no meaning outside Unix; the mode is still
/// recorded in the index but silently ignored on disk here.
#[cfg(not(unix))]
fn set_regular_file_mode(_file: &fs::File, _mode: FileMode) -> io::Result<()> {
    Ok(())
}

fn remove_empty_ancestors(repo_root: &Path, deleted_path: &Path) {
    let mut dir = deleted_path.parent();
    while let Some(d) = dir {
        if d == repo_root || !d.starts_with(repo_root) {
            break;
        }
        match fs::read_dir(d) {
            Ok(mut entries) if entries.next().is_none() => {
                if fs::remove_dir(d).is_err() {
                    break;
                }
                dir = d.parent();
            }
            _ => break,
        }
    }
}

/// Builds a fresh [`Index`] whose entries match `target_files`, stats each
/// file on disk for current metadata, and persists it.
fn rebuild_index(layout: &RepoLayout, target_files: &FileMap) -> Result<(), WorkdirSyncError> {
    let mut index = Index::new();
    let repo_root = layout.repo_root();
    for (path, (mode, hash)) in target_files {
        let disk_path = repo_root.join(path);
        let stat = stat_for_index(&disk_path)?;
        index.add(IndexEntry::new(
            RepoPathBuf::new(path.clone()).expect("tree-walked paths are already validated"),
            *mode,
            *hash,
            stat,
        ));
    }
    index.write(&layout.index_path()).map_err(WorkdirSyncError::from)
}

#[cfg(unix)]
fn stat_for_index(disk_path: &Path) -> Result<EntryStat, WorkdirSyncError> {
    let metadata = fs::symlink_metadata(disk_path).map_err(WorkdirSyncError::Io)?;
    let size = u32::try_from(metadata.len()).unwrap_or(u32::MAX);
    Ok(EntryStat {
        ctime: (metadata.ctime() as u32, metadata.ctime_nsec() as u32),
        mtime: (metadata.mtime() as u32, metadata.mtime_nsec() as u32),
        dev: metadata.dev() as u32,
        ino: metadata.ino() as u32,
        uid: metadata.uid(),
        gid: metadata.gid(),
        size,
    })
}

/// POSIX device/inode identity and ownership have no equivalent outside
/// Unix; zeroed here rather than guessed, matching how `dev`/`ino`/`uid`/
/// `gid` are documented as best-effort fields.
#[cfg(not(unix))]
fn stat_for_index(disk_path: &Path) -> Result<EntryStat, WorkdirSyncError> {
    let metadata = fs::symlink_metadata(disk_path).map_err(WorkdirSyncError::Io)?;
    let size = u32::try_from(metadata.len()).unwrap_or(u32::MAX);
    let seconds = mtime_seconds(&metadata);
    Ok(EntryStat {
        ctime: (seconds, 0),
        mtime: (seconds, 0),
        dev: 0,
        ino: 0,
        uid: 0,
        gid: 0,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{RepoLayout, DEFAULT_METADATA_DIR_NAME};

    fn new_repo() -> (tempfile::TempDir, RepoLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = RepoLayout::new(dir.path(), DEFAULT_METADATA_DIR_NAME);
        layout.initialize("main").unwrap();
        (dir, layout)
    }

    fn commit_with_files(layout: &RepoLayout, files: &[(&str, &[u8])]) -> ObjectHash {
        let store = layout.object_store();
        let mut index = Index::new();
        for (path, content) in files {
            let hash = store.write(&Object::Blob(content.to_vec())).unwrap();
            index.add(IndexEntry::new(
                RepoPathBuf::new(*path).unwrap(),
                FileMode::Regular,
                hash,
                EntryStat::default(),
            ));
        }
        let tree = crate::tree_builder::build_tree_from_index(&index, &store).unwrap();
        let person = crate::objects::CommitPerson::new("Test", "test@example.com", 0, 0).unwrap();
        let commit = crate::objects::Commit::new(tree, vec![], person.clone(), person, "checkout test\n");
        store.write(&Object::Commit(commit)).unwrap()
    }

    #[test]
    fn checkout_round_trip_from_empty_workdir() {
        let (dir, layout) = new_repo();
        let commit = commit_with_files(&layout, &[("a.txt", b"h1"), ("d/b.txt", b"h2")]);

        let outcome = update_to_commit(&layout, commit, UpdateOptions::default()).unwrap();
        let UpdateOutcome::Applied(report) = outcome else {
            panic!("expected applied outcome");
        };
        assert_eq!(report.files_changed, 2);
        assert!(matches!(report.index_report, IndexRewriteReport::Written));

        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"h1");
        assert_eq!(fs::read(dir.path().join("d/b.txt")).unwrap(), b"h2");

        let index = layout.read_index().unwrap();
        assert_eq!(index.entries().len(), 2);
    }

    #[test]
    fn dirty_workdir_blocks_update_without_force() {
        let (dir, layout) = new_repo();
        let commit = commit_with_files(&layout, &[("a.txt", b"h1")]);
        update_to_commit(&layout, commit, UpdateOptions::default()).unwrap();

        fs::write(dir.path().join("a.txt"), b"locally edited").unwrap();

        let second_commit = commit_with_files(&layout, &[("a.txt", b"h1-updated")]);
        let err = update_to_commit(&layout, second_commit, UpdateOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            WorkdirSyncError::DirtyWorkdir { ref modified, .. } if modified == &["a.txt".to_string()]
        ));
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"locally edited");
    }

    #[test]
    fn dry_run_reports_without_mutating() {
        let (dir, layout) = new_repo();
        let commit = commit_with_files(&layout, &[("a.txt", b"h1")]);
        let outcome = update_to_commit(
            &layout,
            commit,
            UpdateOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .unwrap();
        let UpdateOutcome::DryRun(report) = outcome else {
            panic!("expected dry run outcome");
        };
        assert_eq!(report.operations.len(), 1);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn dry_run_detects_create_over_directory_conflict() {
        let (dir, layout) = new_repo();
        fs::create_dir(dir.path().join("a.txt")).unwrap();
        let commit = commit_with_files(&layout, &[("a.txt", b"h1")]);
        let outcome = update_to_commit(
            &layout,
            commit,
            UpdateOptions {
                dry_run: true,
                force: true,
                ..Default::default()
            },
        )
        .unwrap();
        let UpdateOutcome::DryRun(report) = outcome else {
            panic!("expected dry run outcome");
        };
        assert!(report.operations[0].conflict.is_some());
    }

    #[test]
    fn dry_run_detects_ancestor_file_conflict() {
        let (dir, layout) = new_repo();
        fs::write(dir.path().join("a"), b"blocks directory creation").unwrap();
        let commit = commit_with_files(&layout, &[("a/b.txt", b"h1")]);
        let outcome = update_to_commit(
            &layout,
            commit,
            UpdateOptions {
                dry_run: true,
                force: true,
                ..Default::default()
            },
        )
        .unwrap();
        let UpdateOutcome::DryRun(report) = outcome else {
            panic!("expected dry run outcome");
        };
        assert!(report.operations[0].conflict.is_some());
    }

    #[test]
    fn untracked_file_at_create_target_blocks_update_without_force() {
        let (dir, layout) = new_repo();
        let commit = commit_with_files(&layout, &[("a.txt", b"h1")]);

        fs::write(dir.path().join("a.txt"), b"untracked, never staged").unwrap();

        let err = update_to_commit(&layout, commit, UpdateOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            WorkdirSyncError::DirtyWorkdir { ref modified, .. } if modified == &["a.txt".to_string()]
        ));
        // The untracked file must survive untouched; it was never applied.
        assert_eq!(
            fs::read(dir.path().join("a.txt")).unwrap(),
            b"untracked, never staged"
        );
    }

    #[test]
    fn ignore_filter_excludes_untracked_create_target_from_dirty_check() {
        let (dir, layout) = new_repo();
        let commit = commit_with_files(&layout, &[("a.txt", b"h1")]);

        fs::write(dir.path().join("a.txt"), b"untracked but ignored").unwrap();

        let outcome = update_to_commit(
            &layout,
            commit,
            UpdateOptions {
                ignore: Some(Box::new(|path: &str, _is_dir: bool| path == "a.txt")),
                ..Default::default()
            },
        )
        .unwrap();
        let UpdateOutcome::Applied(report) = outcome else {
            panic!("expected applied outcome");
        };
        assert_eq!(report.files_changed, 1);
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"h1");
    }

    #[test]
    fn deleting_a_file_prunes_its_now_empty_parent() {
        let (dir, layout) = new_repo();
        let first = commit_with_files(&layout, &[("d/only.txt", b"x")]);
        update_to_commit(&layout, first, UpdateOptions::default()).unwrap();
        assert!(dir.path().join("d").is_dir());

        let second = commit_with_files(&layout, &[]);
        update_to_commit(&layout, second, UpdateOptions::default()).unwrap();
        assert!(!dir.path().join("d").exists());
    }

    #[test]
    fn force_overwrites_local_modifications() {
        let (dir, layout) = new_repo();
        let first = commit_with_files(&layout, &[("a.txt", b"original")]);
        update_to_commit(&layout, first, UpdateOptions::default()).unwrap();
        fs::write(dir.path().join("a.txt"), b"locally edited").unwrap();

        let second = commit_with_files(&layout, &[("a.txt", b"updated")]);
        let outcome = update_to_commit(
            &layout,
            second,
            UpdateOptions {
                force: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Applied(_)));
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"updated");
    }

    #[test]
    fn rollback_undoes_earlier_creates_and_restores_a_pruned_directory() {
        let (dir, layout) = new_repo();
        let store = layout.object_store();

        // "_old/file.txt" sorts before "a.txt" lexicographically, so its
        // delete commits first in the plan, pruning "_old"; "b.txt"'s
        // create fails next, forcing rollback to recreate that directory.
        let first = commit_with_files(&layout, &[("_old/file.txt", b"will be deleted")]);
        update_to_commit(&layout, first, UpdateOptions::default()).unwrap();
        assert!(dir.path().join("_old").is_dir());

        let mut index = Index::new();
        let hash_a = store.write(&Object::Blob(b"a content".to_vec())).unwrap();
        let missing_hash = Object::Blob(b"never written to the store".to_vec()).hash();
        let hash_c = store.write(&Object::Blob(b"c content".to_vec())).unwrap();
        index.add(IndexEntry::new(
            RepoPathBuf::new("a.txt").unwrap(),
            FileMode::Regular,
            hash_a,
            EntryStat::default(),
        ));
        index.add(IndexEntry::new(
            RepoPathBuf::new("b.txt").unwrap(),
            FileMode::Regular,
            missing_hash,
            EntryStat::default(),
        ));
        index.add(IndexEntry::new(
            RepoPathBuf::new("c.txt").unwrap(),
            FileMode::Regular,
            hash_c,
            EntryStat::default(),
        ));
        let tree = crate::tree_builder::build_tree_from_index(&index, &store).unwrap();
        let person = crate::objects::CommitPerson::new("Test", "test@example.com", 0, 0).unwrap();
        let commit = crate::objects::Commit::new(tree, vec![first], person.clone(), person, "rollback test\n");
        let target = store.write(&Object::Commit(commit)).unwrap();

        let err = update_to_commit(&layout, target, UpdateOptions::default()).unwrap_err();
        let WorkdirSyncError::TransactionAborted { rolled_back, failed_op, .. } = err else {
            panic!("expected a transaction-aborted error");
        };
        assert!(rolled_back);
        assert_eq!(failed_op, "b.txt");

        // "a.txt"'s create committed before the failure, then was undone.
        assert!(!dir.path().join("a.txt").exists());
        // "c.txt" was never reached.
        assert!(!dir.path().join("c.txt").exists());
        // "_old/file.txt"'s delete committed before the failure too, and its
        // pruned parent directory must be recreated during rollback.
        assert_eq!(fs::read(dir.path().join("_old/file.txt")).unwrap(), b"will be deleted");
    }
}
