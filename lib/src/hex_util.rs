//! Hex string helpers for [`crate::object_id::ObjectHash`].

/// Decodes a 40-character lowercase hex string into 20 raw bytes.
///
/// Returns `None` if `hex` is not exactly 40 characters, or contains a
/// non-hex-digit byte.
pub fn decode_hash_hex(hex: impl AsRef<[u8]>) -> Option<[u8; 20]> {
    let hex = hex.as_ref();
    if hex.len() != 40 {
        return None;
    }
    let mut out = [0u8; 20];
    for (i, chunk) in hex.chunks_exact(2).enumerate() {
        let hi = hex_value(chunk[0])?;
        let lo = hex_value(chunk[1])?;
        out[i] = (hi << 4) | lo;
    }
    Some(out)
}

/// Encodes 20 raw bytes as a 40-character lowercase hex string.
pub fn encode_hash_hex(bytes: &[u8; 20]) -> String {
    hex::encode(bytes)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let bytes: [u8; 20] = [
            0x4b, 0x82, 0x5d, 0xc6, 0x42, 0xcb, 0x6e, 0xb9, 0xa0, 0x60, 0xe5, 0x4b, 0xf8, 0xd6,
            0x92, 0x88, 0xfb, 0xee, 0x49, 0x04,
        ];
        let hex = encode_hash_hex(&bytes);
        assert_eq!(hex, "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert_eq!(decode_hash_hex(&hex), Some(bytes));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(decode_hash_hex("abcd"), None);
        assert_eq!(decode_hash_hex("z".repeat(40)), None);
        assert_eq!(decode_hash_hex("A".repeat(40)), None); // uppercase rejected
    }
}
