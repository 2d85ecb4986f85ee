//! scrypt throughput calibration.

use std::time::{Duration, Instant};

use crate::error::{Result, ScryptboxError};

/// Calibration runs scrypt with N = 2^7, r = 1, p = 1.
const CALIBRATION_LOG_N: u8 = 7;
/// salsa20/8 cores per calibration run: 4 * N * r * p.
const CORES_PER_RUN: f64 = 4.0 * 128.0;
const CALIBRATION_WINDOW: Duration = Duration::from_millis(10);

/// Measures how many salsa20/8 core invocations per second this host runs.
pub fn salsa_cores_per_sec() -> Result<f64> {
    let params = scrypt::Params::new(CALIBRATION_LOG_N, 1, 1, 16)
        .map_err(|e| ScryptboxError::ResourceProbeFailed(format!("calibration params: {e}")))?;
    let mut out = [0u8; 16];

    let start = Instant::now();
    let mut runs: u64 = 0;
    let elapsed = loop {
        scrypt::scrypt(&[], &[], &params, &mut out)
            .map_err(|e| ScryptboxError::ResourceProbeFailed(format!("calibration run: {e}")))?;
        runs += 1;

        let elapsed = start.elapsed();
        if elapsed >= CALIBRATION_WINDOW {
            break elapsed;
        }
    };

    let rate = runs as f64 * CORES_PER_RUN / elapsed.as_secs_f64();
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ScryptboxError::ResourceProbeFailed(
            "clock did not advance during calibration".to_string(),
        ));
    }
    Ok(rate)
}
