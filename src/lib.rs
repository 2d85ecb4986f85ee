//! Password-based encryption and key derivation built on scrypt.
//!
//! [`encrypt`] and [`decrypt`] produce and consume self-describing
//! containers in the tarsnap `scrypt` format, picking scrypt cost parameters
//! from a memory and time [`Budget`]. [`hash`] exposes the raw KDF with
//! caller-chosen parameters.

mod cost;
mod crypto;
mod error;
mod format;
mod storage;

pub use crate::cost::{Budget, DEFAULT_R, HostProfile, Purpose};
pub use crate::crypto::kdf::{DEFAULT_HASH_N, DEFAULT_HASH_P, DEFAULT_HASH_R};
pub use crate::crypto::{HASH_LEN, ScryptParams, hash};
pub use crate::error::{Result, ScryptboxError};
pub use crate::format::OVERHEAD;
pub use crate::storage::Storage;

use serde::Serialize;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::format::{Container, Header};

/// Encrypts `plaintext` under `password`, probing the host to size the KDF.
///
/// The output is exactly [`OVERHEAD`] bytes longer than the input.
pub fn encrypt(plaintext: &[u8], password: &[u8], budget: &Budget) -> Result<Vec<u8>> {
    let host = HostProfile::probe()?;
    encrypt_with_profile(plaintext, password, budget, &host)
}

/// Encrypts `plaintext` using a pre-calibrated [`HostProfile`].
pub fn encrypt_with_profile(
    plaintext: &[u8],
    password: &[u8],
    budget: &Budget,
    host: &HostProfile,
) -> Result<Vec<u8>> {
    let salt = crypto::generate_salt()?;
    let params = cost::estimate(budget, Purpose::Encrypt, host)?;
    let keys = crypto::derive_keys(password, &salt, &params)?;

    let mut ciphertext = copy_buffer(plaintext)?;
    crypto::apply_keystream(keys.enc_key(), &mut ciphertext)?;

    let raw_header = Header::new(params, salt).seal(keys.mac_key())?;
    let tag = crypto::mac(keys.mac_key(), &[raw_header.as_slice(), ciphertext.as_slice()])?;

    debug!(
        log_n = params.log_n(),
        r = params.r(),
        p = params.p(),
        len = plaintext.len(),
        "encrypted payload"
    );
    format::serialize(&raw_header, &ciphertext, &tag)
}

/// Decrypts a container produced by [`encrypt`].
///
/// The blob is parsed before the host is probed, so malformed input fails
/// immediately.
///
/// # Errors
///
/// Format errors come first, then [`ScryptboxError::TooMuchMemory`] or
/// [`ScryptboxError::TooMuchTime`] if the stored parameters exceed `budget`,
/// and [`ScryptboxError::IncorrectPassword`] if authentication fails.
/// Containers with `log2(N) >= 16 r` are valid but unsupported by the scrypt
/// backend and fail with [`ScryptboxError::DerivationFailed`].
pub fn decrypt(blob: &[u8], password: &[u8], budget: &Budget) -> Result<Zeroizing<Vec<u8>>> {
    let container = format::parse(blob)?;
    let host = HostProfile::probe()?;
    open(&container, password, budget, &host)
}

/// Decrypts a container using a pre-calibrated [`HostProfile`].
pub fn decrypt_with_profile(
    blob: &[u8],
    password: &[u8],
    budget: &Budget,
    host: &HostProfile,
) -> Result<Zeroizing<Vec<u8>>> {
    let container = format::parse(blob)?;
    open(&container, password, budget, host)
}

fn open(
    container: &Container<'_>,
    password: &[u8],
    budget: &Budget,
    host: &HostProfile,
) -> Result<Zeroizing<Vec<u8>>> {
    let params = container.params();
    if let Err(e) = cost::check(params, budget, Purpose::Decrypt, host) {
        warn!(
            log_n = params.log_n(),
            r = params.r(),
            p = params.p(),
            "refusing to decrypt: {e}"
        );
        return Err(e);
    }

    let keys = crypto::derive_keys(password, container.header().salt(), params)?;
    container.verify(keys.mac_key())?;

    let mut plaintext = Zeroizing::new(copy_buffer(container.ciphertext())?);
    crypto::apply_keystream(keys.enc_key(), &mut plaintext)?;

    debug!(len = plaintext.len(), "decrypted payload");
    Ok(plaintext)
}

fn copy_buffer(data: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(data.len())
        .map_err(|_| ScryptboxError::AllocationFailed)?;
    buf.extend_from_slice(data);
    Ok(buf)
}

/// Cost parameters and salt of a container, readable without the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub log_n: u8,
    pub n: u64,
    pub r: u32,
    pub p: u32,
    /// Bytes of memory a decryption needs.
    pub memory_bytes: u64,
    /// salsa20/8 core invocations a decryption needs.
    pub salsa_cores: u64,
    /// Hex-encoded salt.
    pub salt: String,
}

impl ContainerInfo {
    /// Predicted decryption time on `host`, in seconds.
    pub fn estimated_seconds(&self, host: &HostProfile) -> f64 {
        self.salsa_cores as f64 / host.cores_per_sec()
    }
}

/// Parses a container header without deriving any key.
pub fn inspect(blob: &[u8]) -> Result<ContainerInfo> {
    let container = format::parse(blob)?;
    let params = container.params();

    Ok(ContainerInfo {
        log_n: params.log_n(),
        n: params.n(),
        r: params.r(),
        p: params.p(),
        memory_bytes: u64::try_from(params.memory_bytes()).unwrap_or(u64::MAX),
        salsa_cores: u64::try_from(params.salsa_cores()).unwrap_or(u64::MAX),
        salt: hex::encode(container.header().salt()),
    })
}
