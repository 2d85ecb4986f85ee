//! Container format v0, as written by the tarsnap `scrypt` utility.
//!
//! V0 Format:
//! ```text
//! MAGIC (6) | VERSION (1) | LOG_N (1) | R (4, BE) | P (4, BE) | SALT (32) | CHECKSUM (16) | HEADER_MAC (32) | CIPHERTEXT | TAG (32)
//! ```
//!
//! `CHECKSUM` is the first half of SHA-256 over the preceding 48 bytes,
//! `HEADER_MAC` is HMAC-SHA256 over the preceding 64 bytes and `TAG` is
//! HMAC-SHA256 over everything before it.

use super::{Container, MAGIC, MAGIC_LEN, VER_LEN};
use crate::crypto::{self, CHECKSUM_LEN, SALT_LEN, ScryptParams, TAG_LEN};
use crate::error::{Result, ScryptboxError};

/// Format version written by this crate.
pub const VERSION_V0: u8 = 0;

const LOG_N_LEN: usize = 1;
const R_LEN: usize = 4;
const P_LEN: usize = 4;

/// Bytes covered by the checksum.
const PARAMS_END: usize = MAGIC_LEN + VER_LEN + LOG_N_LEN + R_LEN + P_LEN + SALT_LEN;
/// Bytes covered by the header MAC.
const CHECKSUM_END: usize = PARAMS_END + CHECKSUM_LEN;
/// Full header length, including its MAC.
pub const HEADER_LEN: usize = CHECKSUM_END + TAG_LEN;

/// Cost parameters and salt stored in clear at the front of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    params: ScryptParams,
    salt: [u8; SALT_LEN],
}

impl Header {
    pub fn new(params: ScryptParams, salt: [u8; SALT_LEN]) -> Self {
        Self { params, salt }
    }

    pub fn params(&self) -> &ScryptParams {
        &self.params
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Encodes the header and appends its checksum and MAC.
    pub fn seal(&self, mac_key: &[u8]) -> Result<[u8; HEADER_LEN]> {
        let mut buf = [0u8; HEADER_LEN];

        let mut offset = 0;
        buf[offset..offset + MAGIC_LEN].copy_from_slice(MAGIC);
        offset += MAGIC_LEN;

        buf[offset] = VERSION_V0;
        offset += VER_LEN;

        buf[offset] = self.params.log_n();
        offset += LOG_N_LEN;

        buf[offset..offset + R_LEN].copy_from_slice(&self.params.r().to_be_bytes());
        offset += R_LEN;

        buf[offset..offset + P_LEN].copy_from_slice(&self.params.p().to_be_bytes());
        offset += P_LEN;

        buf[offset..offset + SALT_LEN].copy_from_slice(&self.salt);
        offset += SALT_LEN;

        let checksum = crypto::checksum(&buf[..PARAMS_END]);
        buf[offset..offset + CHECKSUM_LEN].copy_from_slice(&checksum);
        offset += CHECKSUM_LEN;

        let header_mac = crypto::mac(mac_key, &[&buf[..CHECKSUM_END]])?;
        buf[offset..offset + TAG_LEN].copy_from_slice(&header_mac);

        Ok(buf)
    }
}

/// Parses a v0 container. Magic, version and minimum length are checked by
/// the caller.
///
/// # Errors
///
/// Returns [`ScryptboxError::InvalidFormat`] if the checksum does not match or
/// the stored cost parameters are structurally invalid.
pub fn parse(data: &[u8]) -> Result<Container<'_>> {
    if data.len() < HEADER_LEN + TAG_LEN {
        return Err(ScryptboxError::InvalidFormat);
    }

    let expected = crypto::checksum(&data[..PARAMS_END]);
    if data[PARAMS_END..CHECKSUM_END] != expected {
        return Err(ScryptboxError::InvalidFormat);
    }

    let mut offset = MAGIC_LEN + VER_LEN;

    let log_n = data[offset];
    offset += LOG_N_LEN;

    let r = u32::from_be_bytes(read_array(data, offset)?);
    offset += R_LEN;

    let p = u32::from_be_bytes(read_array(data, offset)?);
    offset += P_LEN;

    let salt: [u8; SALT_LEN] = read_array(data, offset)?;

    let params = ScryptParams::new(log_n, r, p).map_err(|_| ScryptboxError::InvalidFormat)?;
    let tag_start = data.len() - TAG_LEN;

    Ok(Container {
        header: Header::new(params, salt),
        raw_header: &data[..HEADER_LEN],
        ciphertext: &data[HEADER_LEN..tag_start],
        tag: &data[tag_start..],
    })
}

/// Checks the MAC at the end of a raw v0 header.
pub(crate) fn verify_header_mac(raw_header: &[u8], mac_key: &[u8]) -> Result<()> {
    crypto::verify_mac(
        mac_key,
        &[&raw_header[..CHECKSUM_END]],
        &raw_header[CHECKSUM_END..HEADER_LEN],
    )
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(ScryptboxError::InvalidFormat)
}
