//! The binary staging index: Git's DIRC format, v2 (with v3 extended-flag
//! support on read).
//!
//! Entry layout and the `(40 + 20 + 2 + name_len + 8) & !7` padding formula
//! are grounded directly in Git's own cache entry encoding, as reproduced by
//! the `gitr` reimplementation's `write_entry`/`build_tree`. Atomic rewrite
//! follows the same temp-file-then-rename idiom as
//! [`crate::object_store::ObjectStore`].

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::IndexError;
use crate::object_id::ObjectHash;
use crate::objects::FileMode;
use crate::repo_path::RepoPathBuf;

const SIGNATURE: &[u8; 4] = b"DIRC";

/// Merge stage, 0-3. Stage 0 is the normal, unconflicted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stage(u8);

impl Stage {
    /// The normal (unconflicted) stage.
    pub const NORMAL: Stage = Stage(0);

    /// Wraps a raw stage number, which must be in `0..=3`.
    pub fn new(raw: u8) -> Option<Self> {
        (raw <= 3).then_some(Self(raw))
    }

    /// The raw stage number.
    pub fn raw(self) -> u8 {
        self.0
    }
}

/// Cheap on-disk staleness metadata captured alongside a staged blob hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryStat {
    /// File change time, (seconds, nanoseconds).
    pub ctime: (u32, u32),
    /// File modification time, (seconds, nanoseconds).
    pub mtime: (u32, u32),
    /// Device identifier.
    pub dev: u32,
    /// Inode number.
    pub ino: u32,
    /// POSIX uid; zeroed on systems without one.
    pub uid: u32,
    /// POSIX gid; zeroed on systems without one.
    pub gid: u32,
    /// File size. A value of `u32::MAX` is used for sizes that overflow 32
    /// bits, and forces a content rehash rather than a stat-only comparison.
    pub size: u32,
}

/// One staged path: content hash plus enough filesystem metadata for a
/// cheap staleness check without rereading file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    path: RepoPathBuf,
    stage: Stage,
    mode: FileMode,
    hash: ObjectHash,
    stat: EntryStat,
    assume_valid: bool,
}

impl IndexEntry {
    /// Constructs a staged entry at stage 0 with the given mode, hash, and
    /// stat metadata.
    pub fn new(path: RepoPathBuf, mode: FileMode, hash: ObjectHash, stat: EntryStat) -> Self {
        Self {
            path,
            stage: Stage::NORMAL,
            mode,
            hash,
            stat,
            assume_valid: false,
        }
    }

    /// The staged path.
    pub fn path(&self) -> &RepoPathBuf {
        &self.path
    }

    /// The merge stage this entry occupies.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The recorded file mode.
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// The hash of the staged blob (or, for gitlinks, the referenced
    /// commit).
    pub fn hash(&self) -> ObjectHash {
        self.hash
    }

    /// Cheap staleness-detection metadata.
    pub fn stat(&self) -> EntryStat {
        self.stat
    }

    /// Whether Git's assume-unchanged-style skip-worktree-check bit is set.
    pub fn assume_valid(&self) -> bool {
        self.assume_valid
    }

    fn sort_key(&self) -> (&[u8], Stage) {
        (self.path.as_internal_str().as_bytes(), self.stage)
    }
}

/// An ordered, duplicate-free set of [`IndexEntry`] values: the staging
/// surface between the working directory and the object store.
#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in canonical `(path, stage)` order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Looks up the stage-0 entry at `path`.
    pub fn get(&self, path: &RepoPathBuf) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .find(|e| e.path == *path && e.stage == Stage::NORMAL)
    }

    /// Inserts or replaces the entry at `(entry.path, entry.stage)`,
    /// keeping the index sorted.
    pub fn add(&mut self, entry: IndexEntry) {
        self.remove_at_stage(&entry.path, entry.stage);
        let pos = self
            .entries
            .partition_point(|e| e.sort_key() < entry.sort_key());
        self.entries.insert(pos, entry);
    }

    /// Removes every stage of `path`. Returns whether anything was removed.
    pub fn remove(&mut self, path: &RepoPathBuf) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.path != path);
        self.entries.len() != before
    }

    fn remove_at_stage(&mut self, path: &RepoPathBuf, stage: Stage) {
        self.entries.retain(|e| !(&e.path == path && e.stage == stage));
    }

    /// Reads and validates an index file from `path`. A missing file is
    /// reported as [`IndexError::NotInitialized`]; callers that want "empty
    /// index if absent" semantics should catch that case themselves.
    pub fn read(path: &Path) -> Result<Self, IndexError> {
        let bytes = fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IndexError::NotInitialized(path.to_path_buf())
            } else {
                IndexError::Io(e)
            }
        })?;
        Self::parse(&bytes)
    }

    fn parse(bytes: &[u8]) -> Result<Self, IndexError> {
        if bytes.len() < 12 + 20 {
            return Err(IndexError::CorruptIndex("file too short".into()));
        }
        let (body, trailer) = bytes.split_at(bytes.len() - 20);
        let expected = sha1_of(body);
        if expected != trailer {
            return Err(IndexError::CorruptIndex("checksum mismatch".into()));
        }

        if &body[0..4] != SIGNATURE {
            return Err(IndexError::CorruptIndex("bad signature".into()));
        }
        let version = u32::from_be_bytes(body[4..8].try_into().unwrap());
        if version != 2 && version != 3 {
            return Err(IndexError::CorruptIndex(format!("unsupported version {version}")));
        }
        let count = u32::from_be_bytes(body[8..12].try_into().unwrap()) as usize;

        let mut entries = Vec::with_capacity(count);
        let mut pos = 12;
        for _ in 0..count {
            let (entry, consumed) = read_entry(body, pos, version)?;
            pos += consumed;
            entries.push(entry);
        }
        // Extensions, if any, follow; this core does not interpret them, so
        // no attempt is made to preserve or re-emit them on write.

        Ok(Self { entries })
    }

    /// Canonically sorts, recomputes the checksum, and atomically rewrites
    /// the index file at `path`.
    pub fn write(&self, path: &Path) -> Result<(), IndexError> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut body = Vec::new();
        body.extend_from_slice(SIGNATURE);
        body.extend_from_slice(&2u32.to_be_bytes());
        body.extend_from_slice(&(sorted.len() as u32).to_be_bytes());
        for entry in &sorted {
            write_entry(&mut body, entry);
        }
        let checksum = sha1_of(&body);

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(IndexError::Io)?;
        let mut temp = NamedTempFile::new_in(dir).map_err(IndexError::Io)?;
        temp.write_all(&body).map_err(IndexError::Io)?;
        temp.write_all(&checksum).map_err(IndexError::Io)?;
        temp.as_file().sync_data().map_err(IndexError::Io)?;
        temp.persist(path).map_err(|e| IndexError::Io(e.error))?;
        Ok(())
    }
}

fn sha1_of(bytes: &[u8]) -> [u8; 20] {
    use sha1::Digest as _;
    let mut hasher = sha1::Sha1::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

fn write_entry(buf: &mut Vec<u8>, entry: &IndexEntry) {
    let start = buf.len();
    let stat = entry.stat;
    buf.extend_from_slice(&stat.ctime.0.to_be_bytes());
    buf.extend_from_slice(&stat.ctime.1.to_be_bytes());
    buf.extend_from_slice(&stat.mtime.0.to_be_bytes());
    buf.extend_from_slice(&stat.mtime.1.to_be_bytes());
    buf.extend_from_slice(&stat.dev.to_be_bytes());
    buf.extend_from_slice(&stat.ino.to_be_bytes());
    buf.extend_from_slice(&entry.mode.raw().to_be_bytes());
    buf.extend_from_slice(&stat.uid.to_be_bytes());
    buf.extend_from_slice(&stat.gid.to_be_bytes());
    buf.extend_from_slice(&stat.size.to_be_bytes());
    buf.extend_from_slice(entry.hash.as_bytes());

    let path_bytes = entry.path.as_internal_str().as_bytes();
    let name_len = path_bytes.len().min(0xFFF) as u16;
    let mut flags: u16 = name_len;
    flags |= (entry.stage.raw() as u16) << 12;
    if entry.assume_valid {
        flags |= 0x8000;
    }
    buf.extend_from_slice(&flags.to_be_bytes());

    buf.extend_from_slice(path_bytes);
    buf.push(0);

    let entry_size = (40 + 20 + 2 + path_bytes.len() + 1 + 7) & !7;
    let written = buf.len() - start;
    for _ in written..entry_size {
        buf.push(0);
    }
}

fn read_entry(body: &[u8], start: usize, version: u32) -> Result<(IndexEntry, usize), IndexError> {
    let fixed_len = 40 + 20 + 2;
    if start + fixed_len > body.len() {
        return Err(IndexError::CorruptIndex("truncated entry".into()));
    }
    let f = |off: usize| -> u32 { u32::from_be_bytes(body[start + off..start + off + 4].try_into().unwrap()) };

    let stat = EntryStat {
        ctime: (f(0), f(4)),
        mtime: (f(8), f(12)),
        dev: f(16),
        ino: f(20),
        uid: f(28),
        gid: f(32),
        size: f(36),
    };
    let mode_raw = f(24);
    let mode = FileMode::from_raw(mode_raw)
        .ok_or_else(|| IndexError::CorruptIndex(format!("unrecognized mode {mode_raw:o}")))?;

    let hash_start = start + 40;
    let mut raw_hash = [0u8; 20];
    raw_hash.copy_from_slice(&body[hash_start..hash_start + 20]);
    let hash = ObjectHash::from_bytes(raw_hash);

    let flags_start = hash_start + 20;
    let flags = u16::from_be_bytes(body[flags_start..flags_start + 2].try_into().unwrap());
    let assume_valid = flags & 0x8000 != 0;
    let extended = flags & 0x4000 != 0;
    let stage_raw = ((flags >> 12) & 0x3) as u8;
    let stage = Stage::new(stage_raw).expect("masked to 2 bits");
    let name_len_field = (flags & 0x0FFF) as usize;

    let mut name_start = flags_start + 2;
    if extended {
        if version < 3 {
            return Err(IndexError::CorruptIndex("extended flag set in v2 entry".into()));
        }
        name_start += 2;
    }

    let name_end = if name_len_field == 0x0FFF {
        body[name_start..]
            .iter()
            .position(|&b| b == 0)
            .map(|i| name_start + i)
            .ok_or_else(|| IndexError::CorruptIndex("missing NUL after long name".into()))?
    } else {
        let end = name_start + name_len_field;
        if end > body.len() || body.get(end) != Some(&0) {
            return Err(IndexError::CorruptIndex("name length / NUL mismatch".into()));
        }
        end
    };
    let path_bytes = &body[name_start..name_end];
    let path_str = std::str::from_utf8(path_bytes)
        .map_err(|_| IndexError::CorruptIndex("non-UTF-8 path".into()))?;
    let path = RepoPathBuf::new(path_str)
        .map_err(|e| IndexError::UnsafePath(e.0))?;

    let consumed = (fixed_len + (if extended { 2 } else { 0 }) + path_bytes.len() + 1 + 7) & !7;
    let entry = IndexEntry {
        path,
        stage,
        mode,
        hash,
        stat,
        assume_valid,
    };
    Ok((entry, consumed))
}

/// Builds an [`Index`] keyed by repository path, for components (like
/// [`crate::tree_builder`]) that need grouped, read-only access rather than
/// the ordered `Vec` the on-disk format uses.
pub fn to_path_map(index: &Index) -> BTreeMap<PathBuf, &IndexEntry> {
    index
        .entries()
        .iter()
        .filter(|e| e.stage() == Stage::NORMAL)
        .map(|e| (PathBuf::from(e.path().as_internal_str()), e))
        .collect()
}
