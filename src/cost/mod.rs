//! Translation of memory and time budgets into scrypt cost parameters.
//!
//! Encryption searches for the most expensive `(N, r, p)` that fits the
//! budget. Decryption re-checks the parameters stored in a container against
//! the caller's budget before any key derivation happens.

pub mod cpuperf;
pub mod memlimit;

use tracing::debug;

use crate::crypto::ScryptParams;
use crate::crypto::kdf::MAX_RP;
use crate::error::{Result, ScryptboxError};

/// Block size used for every parameter search.
pub const DEFAULT_R: u32 = 8;

/// Largest memory fraction ever used, and the fallback for nonsense values.
const MAX_MEM_FRAC: f64 = 0.5;

/// Which operation a budget is being resolved for.
///
/// Decryption gets generous defaults so that files produced on a faster
/// machine, or with a larger budget, still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Encrypt,
    Decrypt,
}

impl Purpose {
    pub fn default_max_time(self) -> f64 {
        match self {
            Purpose::Encrypt => 5.0,
            Purpose::Decrypt => 300.0,
        }
    }

    pub fn default_max_mem_frac(self) -> f64 {
        match self {
            Purpose::Encrypt => 0.125,
            Purpose::Decrypt => 0.5,
        }
    }
}

/// Caller limits on the time and memory a derivation may use.
///
/// Unset values fall back to the [`Purpose`] defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Budget {
    max_time: Option<f64>,
    max_mem: u64,
    max_mem_frac: Option<f64>,
}

impl Budget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum derivation time in seconds.
    pub fn with_max_time(mut self, seconds: f64) -> Self {
        self.max_time = Some(seconds);
        self
    }

    /// Maximum memory in bytes. Zero leaves memory bounded by the fraction only.
    pub fn with_max_mem(mut self, bytes: u64) -> Self {
        self.max_mem = bytes;
        self
    }

    /// Maximum fraction of the host memory limit.
    pub fn with_max_mem_frac(mut self, fraction: f64) -> Self {
        self.max_mem_frac = Some(fraction);
        self
    }

    pub fn max_time(&self) -> Option<f64> {
        self.max_time
    }

    pub fn max_mem(&self) -> u64 {
        self.max_mem
    }

    pub fn max_mem_frac(&self) -> Option<f64> {
        self.max_mem_frac
    }
}

/// Memory limit and scrypt throughput of the running host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostProfile {
    memory_limit: u64,
    cores_per_sec: f64,
}

impl HostProfile {
    /// Builds a profile from pre-calibrated values.
    pub fn new(memory_limit: u64, cores_per_sec: f64) -> Self {
        Self {
            memory_limit,
            cores_per_sec,
        }
    }

    /// Queries the memory limit and measures salsa20/8 throughput.
    pub fn probe() -> Result<Self> {
        let memory_limit = memlimit::memory_limit()?;
        let cores_per_sec = cpuperf::salsa_cores_per_sec()?;
        debug!(memory_limit, cores_per_sec, "probed host");
        Ok(Self::new(memory_limit, cores_per_sec))
    }

    pub fn memory_limit(&self) -> u64 {
        self.memory_limit
    }

    pub fn cores_per_sec(&self) -> f64 {
        self.cores_per_sec
    }

    /// Predicted wall-clock seconds for a derivation with `params`.
    pub fn predicted_seconds(&self, params: &ScryptParams) -> f64 {
        params.salsa_cores() as f64 / self.cores_per_sec
    }
}

/// Concrete ceilings derived from a budget on a specific host.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Limits {
    memory: u64,
    ops: f64,
}

impl Limits {
    fn resolve(budget: &Budget, purpose: Purpose, host: &HostProfile) -> Self {
        let mut fraction = budget
            .max_mem_frac
            .unwrap_or_else(|| purpose.default_max_mem_frac());
        if fraction.is_nan() || fraction <= 0.0 || fraction > MAX_MEM_FRAC {
            fraction = MAX_MEM_FRAC;
        }

        let mut memory = (host.memory_limit as f64 * fraction) as u64;
        if budget.max_mem > 0 {
            memory = memory.min(budget.max_mem);
        }

        let max_time = budget
            .max_time
            .unwrap_or_else(|| purpose.default_max_time());
        let max_time = if max_time.is_nan() || max_time < 0.0 {
            0.0
        } else {
            max_time
        };

        Self {
            memory,
            ops: host.cores_per_sec * max_time,
        }
    }

    fn check(&self, params: &ScryptParams) -> Result<()> {
        if params.memory_bytes() > u128::from(self.memory) {
            return Err(ScryptboxError::TooMuchMemory);
        }
        if params.salsa_cores() as f64 > self.ops {
            return Err(ScryptboxError::TooMuchTime);
        }
        Ok(())
    }
}

/// log2 of the largest power of two `N` with `2 <= N <= max_n`.
fn largest_log_n(max_n: f64) -> Option<u8> {
    if max_n.is_nan() || max_n < 2.0 {
        return None;
    }
    Some(max_n.log2().floor().min(63.0) as u8)
}

/// Picks the most expensive parameters that fit `budget` on `host`.
///
/// # Errors
///
/// Returns [`ScryptboxError::ResourceUnavailable`] if not even `N = 2` fits.
/// The budget is never exceeded.
pub fn estimate(budget: &Budget, purpose: Purpose, host: &HostProfile) -> Result<ScryptParams> {
    let limits = Limits::resolve(budget, purpose, host);
    let r = DEFAULT_R;

    // 128 N r <= memory and 4 N r p <= ops: when ops < memory / 32 the CPU
    // bound caps N first.
    let (log_n, p) = if limits.ops < limits.memory as f64 / 32.0 {
        let log_n = largest_log_n(limits.ops / (4.0 * f64::from(r)))
            .ok_or(ScryptboxError::ResourceUnavailable)?;
        (log_n, 1)
    } else {
        let log_n = largest_log_n(limits.memory as f64 / (128.0 * f64::from(r)))
            .ok_or(ScryptboxError::ResourceUnavailable)?;
        let n = (1u64 << log_n) as f64;
        let max_rp = (limits.ops / 4.0 / n).min((MAX_RP - 1) as f64);
        (log_n, ((max_rp as u32) / r).max(1))
    };

    let params =
        ScryptParams::new(log_n, r, p).map_err(|_| ScryptboxError::ResourceUnavailable)?;
    limits
        .check(&params)
        .map_err(|_| ScryptboxError::ResourceUnavailable)?;

    debug!(
        log_n,
        r,
        p,
        memory_limit = limits.memory,
        ops_limit = limits.ops,
        "picked scrypt parameters"
    );
    Ok(params)
}

/// Verifies that `params` stay within `budget` on `host`.
///
/// # Errors
///
/// [`ScryptboxError::TooMuchMemory`] or [`ScryptboxError::TooMuchTime`].
pub fn check(
    params: &ScryptParams,
    budget: &Budget,
    purpose: Purpose,
    host: &HostProfile,
) -> Result<()> {
    let limits = Limits::resolve(budget, purpose, host);
    debug!(
        log_n = params.log_n(),
        r = params.r(),
        p = params.p(),
        memory_limit = limits.memory,
        ops_limit = limits.ops,
        "checking scrypt parameters against budget"
    );
    limits.check(params)
}
