//! Boundary checks applied before values reach either engine.
//!
//! Sensor and lab values must be finite and non-negative. Checks fail fast
//! on the first offending field.

use crate::errors::EngineError;
use crate::models::{InstantaneousReading, LabSample, Npk};

// ---

/// Validate a single named sensor value.
pub fn validate_sensor(field: &str, value: f64) -> Result<(), EngineError> {
    // ---
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::out_of_range(field, value));
    }
    Ok(())
}

/// Validate an NPK triple; `prefix` names the source in error messages.
pub fn validate_npk(prefix: &str, npk: &Npk) -> Result<(), EngineError> {
    // ---
    validate_sensor(&format!("{prefix}.n"), npk.n)?;
    validate_sensor(&format!("{prefix}.p"), npk.p)?;
    validate_sensor(&format!("{prefix}.k"), npk.k)?;
    Ok(())
}

pub fn validate_reading(reading: &InstantaneousReading) -> Result<(), EngineError> {
    // ---
    validate_npk("reading", &reading.npk())?;
    validate_sensor("ph", reading.ph)?;
    validate_sensor("ec", reading.ec)?;
    Ok(())
}

pub fn validate_lab_sample(sample: &LabSample) -> Result<(), EngineError> {
    // ---
    validate_npk(&sample.sample_label, &sample.npk())
}
