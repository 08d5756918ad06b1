//! Stable fingerprints for issue deduplication.
//!
//! The hash input is the engine's own diagnostic serialized as JSON, so a
//! fingerprint follows the upstream diagnostic rather than our model of it.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 over `salt` (8 bytes, little-endian) followed by `content`; the
/// first 8 digest bytes read as a little-endian `u64`, rendered as lowercase hex.
pub fn fingerprint(content: &str, salt: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.to_le_bytes());
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    format!("{:x}", u64::from_le_bytes(head))
}

/// Fingerprint of a native diagnostic via its field-ordered JSON form.
pub fn fingerprint_of<T: Serialize>(native: &T) -> Option<String> {
    serde_json::to_string(native)
        .ok()
        .map(|content| fingerprint(&content, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(fingerprint("error: x", 0), "bb483a0955bcea32");
        assert_eq!(fingerprint("error: x", 1), "74eac4531a6164ad");
        assert_eq!(fingerprint("", 0), "7a0b81a1f57055af");
    }

    #[test]
    fn test_format_is_plain_lowercase_hex() {
        let fp = fingerprint("some diagnostic", 42);
        assert!(!fp.starts_with("0x"));
        assert!(fp.len() <= 16);
        assert!(fp.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(u64::from_str_radix(&fp, 16).is_ok());
    }

    #[test]
    fn test_salt_changes_result() {
        assert_ne!(fingerprint("x", 0), fingerprint("x", 1));
        assert_eq!(fingerprint("x", 7), fingerprint("x", 7));
    }

    #[test]
    fn test_fingerprint_of_follows_field_order() {
        #[derive(Serialize)]
        struct Native {
            line: i64,
            message: &'static str,
        }
        let a = fingerprint_of(&Native { line: 1, message: "m" }).unwrap();
        assert_eq!(a, fingerprint(r#"{"line":1,"message":"m"}"#, 0));
    }
}
