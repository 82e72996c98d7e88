//! Stable key-to-seed derivation.
//!
//! Seeds must be identical across processes, platforms, and toolchain
//! versions, so they come from a SHA-256 digest rather than `std`'s
//! `DefaultHasher`, whose output is explicitly unspecified between releases.

use sha2::{Digest, Sha256};

use crate::types::KeySeed;

/// Run `f` against a fresh SHA-256 state and return the finished digest.
pub fn stable_digest_with(f: impl FnOnce(&mut Sha256)) -> [u8; 32] {
    let mut hasher = Sha256::new();
    f(&mut hasher);
    hasher.finalize().into()
}

/// 32-bit seed for `key`: the first four digest bytes, little-endian.
pub fn stable_seed(key: &str) -> KeySeed {
    let digest = stable_digest_with(|hasher| hasher.update(key.as_bytes()));
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_seed_matches_known_digest_prefix() {
        // sha256("abc") = ba7816bf...
        assert_eq!(stable_seed("abc"), u32::from_le_bytes([0xba, 0x78, 0x16, 0xbf]));
    }

    #[test]
    fn stable_seed_is_repeatable_and_key_sensitive() {
        assert_eq!(stable_seed("240117"), stable_seed("240117"));
        assert_ne!(stable_seed("240117"), stable_seed("240118"));
    }
}
