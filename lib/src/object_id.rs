//! Content-addressed object identifiers.

use std::fmt;

use crate::hex_util;

/// A 20-byte SHA-1 content digest identifying a stored [`crate::objects::Object`].
///
/// Unlike `jj-lib`'s per-kind id types (`FileId`, `TreeId`, `CommitId`, ...),
/// a single [`ObjectHash`] covers blobs, trees, commits, and tags alike: the
/// object's kind is determined by where the hash is looked up, exactly as in
/// real Git. Two distinct byte sequences hashing to the same `ObjectHash`
/// would be a SHA-1 collision; [`crate::object_store::ObjectStore`] treats
/// that as [`crate::error::ObjectStoreError::Corrupt`] rather than silently
/// overwriting the existing object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectHash([u8; 20]);

impl ObjectHash {
    /// Wraps a raw 20-byte digest.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parses a 40-character lowercase hex string.
    pub fn from_hex(hex: impl AsRef<[u8]>) -> Option<Self> {
        hex_util::decode_hash_hex(hex).map(Self)
    }

    /// Returns the raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Renders as 40 lowercase hex characters.
    pub fn hex(&self) -> String {
        hex_util::encode_hash_hex(&self.0)
    }

    /// The fan-out directory name: the first 2 hex characters.
    pub fn fanout_dir(&self) -> String {
        self.hex()[..2].to_string()
    }

    /// The fan-out file name: the remaining 38 hex characters.
    pub fn fanout_file(&self) -> String {
        self.hex()[2..].to_string()
    }
}

impl fmt::Debug for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectHash").field(&self.hex()).finish()
    }
}

impl fmt::Display for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanout_split() {
        let h = ObjectHash::from_hex("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap();
        assert_eq!(h.fanout_dir(), "4b");
        assert_eq!(h.fanout_file(), "825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn display_matches_hex() {
        let h = ObjectHash::from_hex("b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0").unwrap();
        assert_eq!(format!("{h}"), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
    }
}
