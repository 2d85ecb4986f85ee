//! Cryptographic primitives for the container format.
//!
//! Provides scrypt key derivation, AES-256-CTR, HMAC-SHA256 tags and salt
//! generation.

pub mod cipher;
pub mod kdf;

pub use cipher::{apply_keystream, checksum, generate_salt, mac, verify_mac};
pub use kdf::{ScryptParams, derive_keys, hash};

/// Length of the salt (32 bytes).
pub const SALT_LEN: usize = 32;
/// Length of the AES-256 encryption key (32 bytes).
pub const KEY_LEN: usize = 32;
/// Length of the HMAC-SHA256 key (32 bytes).
pub const MAC_KEY_LEN: usize = 32;
/// Length of a full HMAC-SHA256 tag (32 bytes).
pub const TAG_LEN: usize = 32;
/// Length of the truncated SHA-256 header checksum (16 bytes).
pub const CHECKSUM_LEN: usize = 16;
/// Length of the raw hash output (64 bytes).
pub const HASH_LEN: usize = 64;
