use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScryptboxError>;

#[derive(Debug, Error)]
pub enum ScryptboxError {
    #[error("getrlimit, sysinfo or throughput calibration failed: {0}")]
    ResourceProbeFailed(String),

    #[error("no scrypt parameters fit within the memory and time budget")]
    ResourceUnavailable,

    #[error("error computing derived key")]
    DerivationFailed,

    #[error("could not obtain random salt from the operating system")]
    SaltUnavailable,

    #[error("error in cipher backend")]
    CryptoBackend,

    #[error("memory allocation failed")]
    AllocationFailed,

    #[error("data is not a valid scrypt-encrypted block")]
    InvalidFormat,

    #[error("unrecognized scrypt format")]
    UnrecognizedFormat,

    #[error("decrypting file would take too much memory")]
    TooMuchMemory,

    #[error("decrypting file would take too long")]
    TooMuchTime,

    #[error("password is incorrect")]
    IncorrectPassword,

    #[error("error writing output file: {0}")]
    OutputWriteFailed(#[source] io::Error),

    #[error("error reading input file: {0}")]
    InputReadFailed(#[source] io::Error),

    #[error("hash parameters are wrong (r*p should be < 2**30, and N should be a power of two > 1)")]
    InvalidParameters,
}
