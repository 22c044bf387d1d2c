//! # State Digests
//!
//! `ContentDigest` can only be computed from [`CanonicalBytes`], so every
//! digest in the workspace is produced through the canonicalization
//! pipeline. The registry uses it to prove that a rejected call left its
//! state byte-for-byte unchanged.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A SHA-256 digest of canonical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute a SHA-256 digest from canonical bytes.
///
/// Accepts only `&CanonicalBytes`, never raw `&[u8]`.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest { bytes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_digest_is_stable() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        // SHA-256 of the two bytes "{}".
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn display_carries_algorithm_prefix() {
        let cb = CanonicalBytes::new(&serde_json::json!({"a": 1})).unwrap();
        let digest = sha256_digest(&cb);
        let rendered = digest.to_string();
        assert!(rendered.starts_with("sha256:"));
        assert_eq!(rendered.len(), "sha256:".len() + 64);
    }

    #[test]
    fn different_values_differ() {
        let a = sha256_digest(&CanonicalBytes::new(&serde_json::json!({"v": 1})).unwrap());
        let b = sha256_digest(&CanonicalBytes::new(&serde_json::json!({"v": 2})).unwrap());
        assert_ne!(a, b);
    }
}
