//! Container format handling.
//!
//! Provides version-aware parsing and serialization of scrypt-encrypted
//! blobs. Every check here runs before any key derivation, so garbage input
//! is rejected without paying for scrypt.

use crate::crypto::{self, ScryptParams, TAG_LEN};
use crate::error::{Result, ScryptboxError};

pub mod v0;

pub use v0::{HEADER_LEN, Header};

/// Magic bytes identifying a scrypt container ("scrypt").
pub const MAGIC: &[u8; 6] = b"scrypt";
/// Length of magic bytes.
pub const MAGIC_LEN: usize = 6;
/// Length of version field.
pub const VER_LEN: usize = 1;
/// Bytes added to the plaintext length by encryption.
pub const OVERHEAD: usize = HEADER_LEN + TAG_LEN;

/// A parsed container borrowing from the encoded blob.
///
/// Holds the decoded header together with the byte ranges the MACs cover.
#[derive(Debug)]
pub struct Container<'a> {
    header: Header,
    raw_header: &'a [u8],
    ciphertext: &'a [u8],
    tag: &'a [u8],
}

impl<'a> Container<'a> {
    /// Returns the decoded header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the cost parameters stored in the header.
    pub fn params(&self) -> &ScryptParams {
        self.header.params()
    }

    /// Returns the encrypted payload.
    pub fn ciphertext(&self) -> &'a [u8] {
        self.ciphertext
    }

    /// Checks the header MAC and then the trailing tag.
    ///
    /// # Errors
    ///
    /// Returns [`ScryptboxError::IncorrectPassword`] if either MAC does not
    /// match under `mac_key`.
    pub fn verify(&self, mac_key: &[u8]) -> Result<()> {
        v0::verify_header_mac(self.raw_header, mac_key)?;
        crypto::verify_mac(mac_key, &[self.raw_header, self.ciphertext], self.tag)
    }
}

/// Parses a container and returns a borrowed view of it.
///
/// Automatically dispatches to the appropriate version parser.
///
/// # Errors
///
/// Returns an error if:
/// - The blob is shorter than header plus tag ([`ScryptboxError::InvalidFormat`])
/// - The magic bytes or version are unknown ([`ScryptboxError::UnrecognizedFormat`])
/// - The header checksum or cost parameters are invalid ([`ScryptboxError::InvalidFormat`])
pub fn parse(data: &[u8]) -> Result<Container<'_>> {
    if data.len() < OVERHEAD {
        return Err(ScryptboxError::InvalidFormat);
    }

    if &data[..MAGIC_LEN] != MAGIC {
        return Err(ScryptboxError::UnrecognizedFormat);
    }

    match data[MAGIC_LEN] {
        v0::VERSION_V0 => v0::parse(data),
        _ => Err(ScryptboxError::UnrecognizedFormat),
    }
}

/// Serializes a sealed header, ciphertext and tag into one blob.
///
/// # Errors
///
/// Returns [`ScryptboxError::AllocationFailed`] if the output buffer cannot be
/// reserved.
pub fn serialize(
    raw_header: &[u8; HEADER_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(OVERHEAD + ciphertext.len())
        .map_err(|_| ScryptboxError::AllocationFailed)?;

    buf.extend_from_slice(raw_header);
    buf.extend_from_slice(ciphertext);
    buf.extend_from_slice(tag);

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed(ciphertext: &[u8]) -> Vec<u8> {
        let header = Header::new(ScryptParams::new(10, 8, 1).unwrap(), [3u8; 32]);
        let mac_key = [9u8; 32];
        let raw = header.seal(&mac_key).unwrap();
        let tag = crypto::mac(&mac_key, &[raw.as_slice(), ciphertext]).unwrap();
        serialize(&raw, ciphertext, &tag).unwrap()
    }

    #[test]
    fn serialize_then_parse() {
        let blob = sealed(b"ciphertext");
        assert_eq!(blob.len(), b"ciphertext".len() + OVERHEAD);

        let container = parse(&blob).unwrap();
        assert_eq!(container.params().log_n(), 10);
        assert_eq!(container.params().r(), 8);
        assert_eq!(container.params().p(), 1);
        assert_eq!(container.header().salt(), &[3u8; 32]);
        assert_eq!(container.ciphertext(), b"ciphertext");
        container.verify(&[9u8; 32]).unwrap();
    }

    #[test]
    fn empty_payload_is_exactly_overhead() {
        let blob = sealed(b"");
        assert_eq!(blob.len(), OVERHEAD);
        assert!(parse(&blob).unwrap().ciphertext().is_empty());
    }

    #[test]
    fn verify_fails_with_other_key() {
        let blob = sealed(b"ciphertext");
        let container = parse(&blob).unwrap();
        assert!(matches!(
            container.verify(&[8u8; 32]),
            Err(ScryptboxError::IncorrectPassword)
        ));
    }

    #[test]
    fn verify_fails_on_flipped_tag() {
        let mut blob = sealed(b"ciphertext");
        let last = blob.len() - 1;
        blob[last] ^= 0x80;

        let container = parse(&blob).unwrap();
        assert!(matches!(
            container.verify(&[9u8; 32]),
            Err(ScryptboxError::IncorrectPassword)
        ));
    }

    #[test]
    fn too_short_fails() {
        let blob = sealed(b"");
        assert!(matches!(
            parse(&blob[..OVERHEAD - 1]),
            Err(ScryptboxError::InvalidFormat)
        ));
        assert!(matches!(parse(&[]), Err(ScryptboxError::InvalidFormat)));
    }

    #[test]
    fn invalid_magic_fails() {
        let mut blob = sealed(b"data");
        blob[..6].copy_from_slice(b"FAIL!!");
        assert!(matches!(
            parse(&blob),
            Err(ScryptboxError::UnrecognizedFormat)
        ));
    }

    #[test]
    fn unsupported_version_fails() {
        let mut blob = sealed(b"data");
        blob[MAGIC_LEN] = 99;
        assert!(matches!(
            parse(&blob),
            Err(ScryptboxError::UnrecognizedFormat)
        ));
    }
}
