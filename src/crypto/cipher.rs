use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use getrandom::fill;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::{CHECKSUM_LEN, SALT_LEN, TAG_LEN};
use crate::error::{Result, ScryptboxError};

type Aes256Ctr = ctr::Ctr64BE<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Counter block prefix. Every key is derived from a fresh salt, so a fixed
/// nonce never reuses a keystream.
const NONCE: [u8; 16] = [0u8; 16];

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|_| ScryptboxError::SaltUnavailable)
}

/// Generate salt
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// XOR `data` in place with the AES-256-CTR keystream for `key`.
///
/// The same call encrypts and decrypts.
pub fn apply_keystream(key: &[u8], data: &mut [u8]) -> Result<()> {
    let mut cipher =
        Aes256Ctr::new_from_slices(key, &NONCE).map_err(|_| ScryptboxError::CryptoBackend)?;
    cipher
        .try_apply_keystream(data)
        .map_err(|_| ScryptboxError::CryptoBackend)
}

fn keyed(key: &[u8], parts: &[&[u8]]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| ScryptboxError::CryptoBackend)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac)
}

/// HMAC-SHA256 over the concatenation of `parts`.
pub fn mac(key: &[u8], parts: &[&[u8]]) -> Result<[u8; TAG_LEN]> {
    let digest = keyed(key, parts)?.finalize().into_bytes();
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&digest);
    Ok(tag)
}

/// Verify a tag in constant time.
///
/// A mismatch is reported as [`ScryptboxError::IncorrectPassword`]: a wrong
/// password and modified data look the same from here.
pub fn verify_mac(key: &[u8], parts: &[&[u8]], tag: &[u8]) -> Result<()> {
    keyed(key, parts)?
        .verify_slice(tag)
        .map_err(|_| ScryptboxError::IncorrectPassword)
}

/// Truncated SHA-256, used as an unkeyed header checksum.
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha256::digest(data);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}
