//! Cryptography module for ssoadm
//!
//! Provides AES-256-GCM encryption for the local directory cache,
//! keyed by a SHA-256 digest of the operator's passphrase.

mod encryption;
mod kdf;

pub use encryption::{decrypt, encrypt};
pub use kdf::CacheKey;

/// Size of AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;
