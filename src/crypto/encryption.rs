//! AES-256-GCM encryption of the cache blob
//!
//! The snapshot is encrypted as one opaque text blob:
//! - Confidentiality: the user table never touches disk in the clear
//! - Integrity: tampering or a wrong key is detected, not misdecoded
//!
//! The wire form is base64 of `nonce || ciphertext || tag`, so the stored
//! file is printable text with no key metadata in it.

use crate::crypto::{CacheKey, NONCE_SIZE, TAG_SIZE};
use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};

/// Encrypt a text blob, returning a base64-armored ciphertext
pub fn encrypt(plaintext: &str, key: &CacheKey) -> Result<String> {
    let unbound_key = UnboundKey::new(&AES_256_GCM, key.key())
        .map_err(|_| Error::Encryption("Failed to create encryption key".to_string()))?;
    let sealing_key = LessSafeKey::new(unbound_key);

    // Random nonce, unique per encryption
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.as_bytes().to_vec();
    in_out.reserve(TAG_SIZE);

    sealing_key
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| Error::Encryption("Encryption failed".to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + in_out.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&in_out);

    Ok(BASE64.encode(blob))
}

/// Decrypt a base64-armored ciphertext back into text
///
/// Fails with `Error::Decryption` when the blob was not produced with the
/// matching key or has been altered in any way.
pub fn decrypt(armored: &str, key: &CacheKey) -> Result<String> {
    let blob = BASE64
        .decode(armored.trim())
        .map_err(|_| Error::Decryption("Invalid base64 armor".to_string()))?;

    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::Decryption("Ciphertext too short".to_string()));
    }

    let unbound_key = UnboundKey::new(&AES_256_GCM, key.key())
        .map_err(|_| Error::Decryption("Failed to create decryption key".to_string()))?;
    let opening_key = LessSafeKey::new(unbound_key);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(&blob[..NONCE_SIZE]);
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = blob[NONCE_SIZE..].to_vec();
    let plaintext = opening_key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| Error::Decryption("Decryption failed - data corrupted or wrong key".to_string()))?;

    String::from_utf8(plaintext.to_vec())
        .map_err(|_| Error::Decryption("Decrypted data is not valid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> CacheKey {
        CacheKey::derive("test passphrase")
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = test_key();
        let plaintext = "id,username\n1,alice";

        let armored = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&armored, &key).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_plaintext() {
        let key = test_key();

        let armored = encrypt("", &key).unwrap();
        let decrypted = decrypt(&armored, &key).unwrap();

        assert_eq!(decrypted, "");
    }

    #[test]
    fn test_multibyte_plaintext() {
        let key = test_key();
        let plaintext = "usuário,José Ávila,日本語 🚀";

        let armored = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&armored, &key).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = CacheKey::derive("one passphrase");
        let key2 = CacheKey::derive("another passphrase");

        let armored = encrypt("secret directory", &key1).unwrap();
        let result = decrypt(&armored, &key2);

        assert!(matches!(result, Err(Error::Decryption(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key();
        let armored = encrypt("secret directory", &key).unwrap();

        // Flip a byte inside the armored blob
        let mut blob = BASE64.decode(armored.as_bytes()).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xFF;
        let tampered = BASE64.encode(blob);

        let result = decrypt(&tampered, &key);
        assert!(matches!(result, Err(Error::Decryption(_))));
    }

    #[test]
    fn test_garbage_armor_fails() {
        let key = test_key();
        assert!(matches!(
            decrypt("not base64 at all!!!", &key),
            Err(Error::Decryption(_))
        ));
        assert!(matches!(decrypt("AAAA", &key), Err(Error::Decryption(_))));
    }

    #[test]
    fn test_nonce_uniqueness() {
        let key = test_key();
        let a = encrypt("same text", &key).unwrap();
        let b = encrypt("same text", &key).unwrap();
        assert_ne!(a, b);
    }
}
