//! Content-addressed storage of loose [`crate::objects::Object`]s.
//!
//! Objects live under `<metadata_dir>/objects/<first-2-hex>/<remaining-38-hex>`,
//! zlib-compressed, exactly as Git's loose object store lays them out. Writes
//! go through a temp file that is synced then renamed into place, following
//! the same crash-safety pattern `jj-lib` uses for its own content-addressed
//! backend (`persist_content_addressed_temp_file`): on Unix a rename over an
//! existing path is atomic, so a second writer racing to store the same
//! content can never observe a half-written file.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;

use crate::error::ObjectStoreError;
use crate::object_id::ObjectHash;
use crate::objects::Object;

/// A directory of zlib-compressed, fan-out-addressed loose objects.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    /// Wraps an already-created `objects/` directory.
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: objects_dir.into(),
        }
    }

    /// Creates the `objects/` directory (and nothing else) if it doesn't
    /// already exist.
    pub fn initialize(objects_dir: impl Into<PathBuf>) -> Result<Self, ObjectStoreError> {
        let objects_dir = objects_dir.into();
        fs::create_dir_all(&objects_dir).map_err(ObjectStoreError::Io)?;
        Ok(Self::new(objects_dir))
    }

    fn path_for(&self, hash: ObjectHash) -> PathBuf {
        self.objects_dir.join(hash.fanout_dir()).join(hash.fanout_file())
    }

    /// True if an object with this hash is already present.
    pub fn has(&self, hash: ObjectHash) -> bool {
        self.path_for(hash).is_file()
    }

    /// Serializes, compresses, and writes `object`, returning its hash.
    ///
    /// Writing is idempotent: if an object with the computed hash already
    /// exists on disk, this returns without touching it (matching Git's own
    /// loose-object semantics — content-addressed storage has nothing
    /// meaningful to overwrite).
    pub fn write(&self, object: &Object) -> Result<ObjectHash, ObjectStoreError> {
        let hash = object.hash();
        if self.has(hash) {
            return Ok(hash);
        }
        let raw = object.serialize();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).map_err(ObjectStoreError::Io)?;
        let compressed = encoder.finish().map_err(ObjectStoreError::Io)?;

        let dest = self.path_for(hash);
        let dir = dest.parent().expect("fan-out path always has a parent");
        fs::create_dir_all(dir).map_err(ObjectStoreError::Io)?;

        let mut temp = NamedTempFile::new_in(dir).map_err(ObjectStoreError::Io)?;
        temp.write_all(&compressed).map_err(ObjectStoreError::Io)?;
        persist_content_addressed(temp, &dest).map_err(ObjectStoreError::Io)?;

        // Loose objects are immutable; mark read-only the way Git does, on
        // platforms where that's meaningful.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&dest).map_err(ObjectStoreError::Io)?.permissions();
            perms.set_mode(0o444);
            let _ = fs::set_permissions(&dest, perms);
        }

        tracing::trace!(hash = %hash, "wrote object");
        Ok(hash)
    }

    /// Reads and decompresses the object stored at `hash`.
    ///
    /// Returns [`ObjectStoreError::NotFound`] if no loose object file exists
    /// at this hash's fan-out path — a normal outcome, distinct from
    /// [`ObjectStoreError::Corrupt`], which means a file is present but
    /// unreadable as a well-formed object.
    pub fn read(&self, hash: ObjectHash) -> Result<Object, ObjectStoreError> {
        let path = self.path_for(hash);
        let compressed = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ObjectStoreError::NotFound(hash)
            } else {
                ObjectStoreError::Io(e)
            }
        })?;
        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut raw = Vec::new();
        decoder
            .read_to_end(&mut raw)
            .map_err(|_| ObjectStoreError::Corrupt(hash))?;
        let object = Object::deserialize(&raw)?;
        if object.hash() != hash {
            return Err(ObjectStoreError::Corrupt(hash));
        }
        Ok(object)
    }

    /// The number of loose objects currently on disk.
    pub fn count(&self) -> Result<usize, ObjectStoreError> {
        let mut count = 0;
        if !self.objects_dir.is_dir() {
            return Ok(0);
        }
        for fanout_entry in fs::read_dir(&self.objects_dir).map_err(ObjectStoreError::Io)? {
            let fanout_entry = fanout_entry.map_err(ObjectStoreError::Io)?;
            if !fanout_entry.file_type().map_err(ObjectStoreError::Io)?.is_dir() {
                continue;
            }
            for object_entry in fs::read_dir(fanout_entry.path()).map_err(ObjectStoreError::Io)? {
                object_entry.map_err(ObjectStoreError::Io)?;
                count += 1;
            }
        }
        Ok(count)
    }
}

fn persist_content_addressed(temp_file: NamedTempFile, dest: &Path) -> std::io::Result<()> {
    temp_file.as_file().sync_data()?;
    if cfg!(windows) {
        match temp_file.persist_noclobber(dest) {
            Ok(_) => Ok(()),
            Err(e) if dest.is_file() => {
                let _ = e;
                Ok(())
            }
            Err(e) => Err(e.error),
        }
    } else {
        temp_file.persist(dest).map(|_| ()).map_err(|e| e.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Tree;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let object = Object::Blob(b"hello world".to_vec());
        let hash = store.write(&object).unwrap();
        assert!(store.has(hash));
        assert_eq!(store.read(hash).unwrap(), object);
    }

    #[test]
    fn write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let object = Object::Tree(Tree::empty());
        let first = store.write(&object).unwrap();
        let second = store.write(&object).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let missing = ObjectHash::from_hex("0000000000000000000000000000000000000000").unwrap();
        assert!(matches!(store.read(missing), Err(ObjectStoreError::NotFound(_))));
    }

    #[test]
    fn corrupt_object_on_disk_is_distinguished_from_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let object = Object::Blob(b"hello".to_vec());
        let hash = store.write(&object).unwrap();
        fs::write(
            dir.path().join("objects").join(hash.fanout_dir()).join(hash.fanout_file()),
            b"not zlib data",
        )
        .unwrap();
        assert!(matches!(store.read(hash), Err(ObjectStoreError::Corrupt(_))));
    }

    #[test]
    fn fanout_layout_matches_git() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::initialize(dir.path().join("objects")).unwrap();
        let object = Object::Blob(b"hello".to_vec());
        let hash = store.write(&object).unwrap();
        assert_eq!(hash.hex(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
        assert!(dir
            .path()
            .join("objects")
            .join("b6")
            .join("fc4c620b67d95f953a5c1c1230aaab5db5a1b0")
            .is_file());
    }
}
