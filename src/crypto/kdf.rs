use tracing::debug;
use zeroize::Zeroizing;

use super::{HASH_LEN, KEY_LEN, MAC_KEY_LEN};
use crate::cost::memlimit::memory_limit;
use crate::error::{Result, ScryptboxError};

/// Upper bound (exclusive) on `r * p`.
pub const MAX_RP: u64 = 1 << 30;

/// Default cost parameters for [`hash`]: N = 2^14, r = 8, p = 1.
pub const DEFAULT_HASH_N: u64 = 1 << 14;
pub const DEFAULT_HASH_R: u32 = 8;
pub const DEFAULT_HASH_P: u32 = 1;

const DERIVED_LEN: usize = KEY_LEN + MAC_KEY_LEN;

/// scrypt cost parameters, with N stored as its base-2 logarithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptParams {
    log_n: u8,
    r: u32,
    p: u32,
}

impl ScryptParams {
    pub fn new(log_n: u8, r: u32, p: u32) -> Result<Self> {
        let params = Self { log_n, r, p };
        params.validate()?;
        Ok(params)
    }

    /// Builds parameters from a literal N, which must be a power of two > 1.
    pub fn from_n(n: u64, r: u32, p: u32) -> Result<Self> {
        if n <= 1 || !n.is_power_of_two() {
            return Err(ScryptboxError::InvalidParameters);
        }
        Self::new(n.trailing_zeros() as u8, r, p)
    }

    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    pub fn n(&self) -> u64 {
        1 << self.log_n
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    /// Bytes of working memory scrypt needs: `128 * N * r`.
    pub fn memory_bytes(&self) -> u128 {
        128 * u128::from(self.n()) * u128::from(self.r)
    }

    /// Number of salsa20/8 core invocations: `4 * N * r * p`.
    pub fn salsa_cores(&self) -> u128 {
        4 * u128::from(self.n()) * u128::from(self.r) * u128::from(self.p)
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_n < 1 || self.log_n > 63 {
            return Err(ScryptboxError::InvalidParameters);
        }
        if self.r < 1 || self.p < 1 {
            return Err(ScryptboxError::InvalidParameters);
        }
        if u64::from(self.r) * u64::from(self.p) >= MAX_RP {
            return Err(ScryptboxError::InvalidParameters);
        }
        Ok(())
    }

    /// Bytes scrypt allocates at once: `V` plus the `B` and `XY` buffers.
    fn working_set_bytes(&self) -> u128 {
        128 * u128::from(self.r) * (u128::from(self.n()) + u128::from(self.p) + 2)
    }

    /// Checks what the scrypt backend needs beyond structural validity.
    ///
    /// The backend requires `log2(N) < 16 r` and allocates its whole working
    /// set up front, aborting the process if that allocation fails.
    fn prepare(&self, output_len: usize) -> Result<scrypt::Params> {
        if u64::from(self.log_n) >= 16 * u64::from(self.r) {
            return Err(ScryptboxError::DerivationFailed);
        }
        ensure_allocatable(self.working_set_bytes())?;
        scrypt::Params::new(self.log_n, self.r, self.p, output_len)
            .map_err(|_| ScryptboxError::DerivationFailed)
    }
}

fn ensure_allocatable(bytes: u128) -> Result<()> {
    let bytes = u64::try_from(bytes).map_err(|_| ScryptboxError::AllocationFailed)?;
    if let Ok(limit) = memory_limit() {
        if bytes > limit {
            return Err(ScryptboxError::AllocationFailed);
        }
    }

    let len = usize::try_from(bytes).map_err(|_| ScryptboxError::AllocationFailed)?;
    let mut reservation: Vec<u8> = Vec::new();
    reservation
        .try_reserve_exact(len)
        .map_err(|_| ScryptboxError::AllocationFailed)
}

/// Encryption and MAC keys produced by one scrypt invocation.
///
/// The backing buffer is wiped on drop.
pub struct DerivedKeys {
    material: Zeroizing<[u8; DERIVED_LEN]>,
}

impl DerivedKeys {
    pub fn enc_key(&self) -> &[u8] {
        &self.material[..KEY_LEN]
    }

    pub fn mac_key(&self) -> &[u8] {
        &self.material[KEY_LEN..]
    }
}

/// Derive the AES and HMAC keys for a container.
pub fn derive_keys(password: &[u8], salt: &[u8], params: &ScryptParams) -> Result<DerivedKeys> {
    params.validate()?;
    let scrypt_params = params.prepare(DERIVED_LEN)?;

    debug!(
        log_n = params.log_n,
        r = params.r,
        p = params.p,
        "deriving container keys"
    );

    let mut material = Zeroizing::new([0u8; DERIVED_LEN]);
    scrypt::scrypt(password, salt, &scrypt_params, material.as_mut_slice())
        .map_err(|_| ScryptboxError::DerivationFailed)?;

    Ok(DerivedKeys { material })
}

/// Compute a raw 64-byte scrypt hash with caller-chosen cost parameters.
///
/// # Errors
///
/// Returns [`ScryptboxError::InvalidParameters`] if `n` is not a power of two
/// greater than one, if `r` or `p` is zero, or if `r * p >= 2^30`.
///
/// Returns [`ScryptboxError::DerivationFailed`] if `log2(n) >= 16 * r`, which
/// the scrypt backend does not support, and
/// [`ScryptboxError::AllocationFailed`] if the `128 * r * (n + p + 2)` byte
/// working set exceeds host memory or cannot be reserved.
pub fn hash(password: &[u8], salt: &[u8], n: u64, r: u32, p: u32) -> Result<[u8; HASH_LEN]> {
    let params = ScryptParams::from_n(n, r, p)?;
    let scrypt_params = params.prepare(HASH_LEN)?;

    let mut out = [0u8; HASH_LEN];
    scrypt::scrypt(password, salt, &scrypt_params, &mut out)
        .map_err(|_| ScryptboxError::DerivationFailed)?;
    Ok(out)
}
