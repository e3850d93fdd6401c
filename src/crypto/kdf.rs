//! Key derivation for the cache encryption key
//!
//! The key is the SHA-256 digest of the operator's passphrase. No salt:
//! the same passphrase must always yield the same key, because the
//! encrypted snapshot on disk carries no key metadata of its own.

use crate::crypto::KEY_SIZE;
use ring::digest::{digest, SHA256};
use zeroize::Zeroizing;

/// Symmetric key protecting the local directory cache
pub struct CacheKey {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl CacheKey {
    /// Derive the cache key from a passphrase
    pub fn derive(passphrase: &str) -> Self {
        let hash = digest(&SHA256, passphrase.as_bytes());

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(hash.as_ref());

        CacheKey {
            key: Zeroizing::new(key),
        }
    }

    /// Wrap existing key material (for callers that manage derivation themselves)
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        CacheKey {
            key: Zeroizing::new(bytes),
        }
    }

    /// Get the raw key bytes
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_deterministic() {
        let key1 = CacheKey::derive("correct horse battery staple");
        let key2 = CacheKey::derive("correct horse battery staple");
        assert_eq!(key1.key(), key2.key());
    }

    #[test]
    fn test_different_passphrases_differ() {
        let key1 = CacheKey::derive("passphrase-a");
        let key2 = CacheKey::derive("passphrase-b");
        assert_ne!(key1.key(), key2.key());
    }

    #[test]
    fn test_key_length() {
        let key = CacheKey::derive("x");
        assert_eq!(key.key().len(), KEY_SIZE);
    }
}
