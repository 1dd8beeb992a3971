//! Status classification and recommendation rules.
//!
//! Each nutrient is compared against a band around its optimal value
//! (`optimal * low_ratio` .. `optimal * high_ratio`). A single
//! recommendation is chosen by strict priority:
//!
//! 1. pH outside `[ph_low, ph_high]` (lockout, fertilizer withheld)
//! 2. nitrogen low
//! 3. phosphorus low
//! 4. potassium low
//! 5. EC below `ec_low`
//! 6. EC above `ec_high`
//! 7. healthy
//!
//! The overall status is `danger` on pH lockout or when any nutrient is
//! below half its low threshold or above double its high threshold,
//! `ok` when all nutrients are in band, and `warning` otherwise.

use serde::Deserialize;

use crate::errors::EngineError;
use crate::models::{InstantaneousReading, Nutrient, NutrientStatus, OverallStatus, StatusResult};

// ---

/// A nutrient below `low_threshold * DANGER_LOW_FACTOR` is in danger.
pub const DANGER_LOW_FACTOR: f64 = 0.5;

/// A nutrient above `high_threshold * DANGER_HIGH_FACTOR` is in danger.
pub const DANGER_HIGH_FACTOR: f64 = 2.0;

/// Optimal reference values and thresholds for status evaluation.
///
/// Defaults are the healthy lettuce targets (N 150, P 50, K 200 ppm), an EC
/// window of 0.8..2.5 mS/cm and a pH window of 5.5..7.0.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusConfig {
    // ---
    pub nitrogen_optimal: f64,
    pub phosphorus_optimal: f64,
    pub potassium_optimal: f64,
    pub ec_low: f64,
    pub ec_high: f64,
    pub ph_low: f64,
    pub ph_high: f64,
    pub low_ratio: f64,
    pub high_ratio: f64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        StatusConfig {
            nitrogen_optimal: 150.0,
            phosphorus_optimal: 50.0,
            potassium_optimal: 200.0,
            ec_low: 0.8,
            ec_high: 2.5,
            ph_low: 5.5,
            ph_high: 7.0,
            low_ratio: 0.9,
            high_ratio: 1.1,
        }
    }
}

/// Partial configuration; unset fields keep the base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverrides {
    // ---
    pub nitrogen_optimal: Option<f64>,
    pub phosphorus_optimal: Option<f64>,
    pub potassium_optimal: Option<f64>,
    pub ec_low: Option<f64>,
    pub ec_high: Option<f64>,
    pub ph_low: Option<f64>,
    pub ph_high: Option<f64>,
    pub low_ratio: Option<f64>,
    pub high_ratio: Option<f64>,
}

impl StatusConfig {
    /// Apply overrides on top of this configuration. No validation happens
    /// here; call [`StatusConfig::validate`] on the result.
    pub fn with_overrides(&self, o: &StatusOverrides) -> Self {
        // ---
        StatusConfig {
            nitrogen_optimal: o.nitrogen_optimal.unwrap_or(self.nitrogen_optimal),
            phosphorus_optimal: o.phosphorus_optimal.unwrap_or(self.phosphorus_optimal),
            potassium_optimal: o.potassium_optimal.unwrap_or(self.potassium_optimal),
            ec_low: o.ec_low.unwrap_or(self.ec_low),
            ec_high: o.ec_high.unwrap_or(self.ec_high),
            ph_low: o.ph_low.unwrap_or(self.ph_low),
            ph_high: o.ph_high.unwrap_or(self.ph_high),
            low_ratio: o.low_ratio.unwrap_or(self.low_ratio),
            high_ratio: o.high_ratio.unwrap_or(self.high_ratio),
        }
    }

    /// Reject malformed bounds. Nothing is corrected silently.
    pub fn validate(&self) -> Result<(), EngineError> {
        // ---
        let finite = [
            ("nitrogenOptimal", self.nitrogen_optimal),
            ("phosphorusOptimal", self.phosphorus_optimal),
            ("potassiumOptimal", self.potassium_optimal),
            ("ecLow", self.ec_low),
            ("ecHigh", self.ec_high),
            ("phLow", self.ph_low),
            ("phHigh", self.ph_high),
            ("lowRatio", self.low_ratio),
            ("highRatio", self.high_ratio),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("{name} must be finite, got {value}")));
        }

        for nutrient in Nutrient::ALL {
            let optimal = self.optimal(nutrient);
            if optimal <= 0.0 {
                return Err(invalid(format!(
                    "{nutrient:?} optimal must be positive, got {optimal}"
                )));
            }
        }
        if self.ph_low >= self.ph_high {
            return Err(invalid(format!(
                "phLow ({}) must be below phHigh ({})",
                self.ph_low, self.ph_high
            )));
        }
        if self.ec_low >= self.ec_high {
            return Err(invalid(format!(
                "ecLow ({}) must be below ecHigh ({})",
                self.ec_low, self.ec_high
            )));
        }
        if self.low_ratio <= 0.0 || self.low_ratio >= self.high_ratio {
            return Err(invalid(format!(
                "ratios must satisfy 0 < lowRatio ({}) < highRatio ({})",
                self.low_ratio, self.high_ratio
            )));
        }
        Ok(())
    }

    pub fn optimal(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen_optimal,
            Nutrient::Phosphorus => self.phosphorus_optimal,
            Nutrient::Potassium => self.potassium_optimal,
        }
    }

    pub fn low_threshold(&self, nutrient: Nutrient) -> f64 {
        self.optimal(nutrient) * self.low_ratio
    }

    pub fn high_threshold(&self, nutrient: Nutrient) -> f64 {
        self.optimal(nutrient) * self.high_ratio
    }

    fn ph_in_range(&self, ph: f64) -> bool {
        ph >= self.ph_low && ph <= self.ph_high
    }
}

fn invalid(msg: String) -> EngineError {
    EngineError::InvalidConfiguration(msg)
}

/// Actionable advice, one per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    PhLockout,
    NitrogenLow,
    PhosphorusLow,
    PotassiumLow,
    SolutionTooWeak,
    DilutionNeeded,
    Healthy,
}

impl Recommendation {
    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::PhLockout => {
                "pH is out of range. Adjust to 5.8-6.5 immediately. Do not add fertilizer yet."
            }
            Recommendation::NitrogenLow => "Nitrogen levels low. Add Calcium Nitrate to reservoir.",
            Recommendation::PhosphorusLow => {
                "Phosphorus levels low. Add Monopotassium Phosphate (MKP)."
            }
            Recommendation::PotassiumLow => "Potassium levels low. Add Potassium Sulfate.",
            Recommendation::SolutionTooWeak => "Solution is too weak. Add balanced nutrient mix.",
            Recommendation::DilutionNeeded => "Nutrient burn risk. Add fresh water to dilute.",
            Recommendation::Healthy => "System healthy. No action required.",
        }
    }
}

/// Classify one nutrient value against its band. Both bounds are exclusive.
pub fn classify(nutrient: Nutrient, value: f64, config: &StatusConfig) -> NutrientStatus {
    // ---
    if value < config.low_threshold(nutrient) {
        NutrientStatus::Low
    } else if value > config.high_threshold(nutrient) {
        NutrientStatus::High
    } else {
        NutrientStatus::Ok
    }
}

/// Pick the highest-priority recommendation for a reading.
pub fn recommend(reading: &InstantaneousReading, config: &StatusConfig) -> Recommendation {
    // ---
    let npk = reading.npk();
    let low = |nutrient| npk.get(nutrient) < config.low_threshold(nutrient);

    if !config.ph_in_range(reading.ph) {
        Recommendation::PhLockout
    } else if low(Nutrient::Nitrogen) {
        Recommendation::NitrogenLow
    } else if low(Nutrient::Phosphorus) {
        Recommendation::PhosphorusLow
    } else if low(Nutrient::Potassium) {
        Recommendation::PotassiumLow
    } else if reading.ec < config.ec_low {
        Recommendation::SolutionTooWeak
    } else if reading.ec > config.ec_high {
        Recommendation::DilutionNeeded
    } else {
        Recommendation::Healthy
    }
}

/// Aggregate nutrient statuses and pH into one overall status.
pub fn overall_status(reading: &InstantaneousReading, config: &StatusConfig) -> OverallStatus {
    // ---
    let npk = reading.npk();
    let danger = !config.ph_in_range(reading.ph)
        || Nutrient::ALL.iter().any(|&nutrient| {
            let value = npk.get(nutrient);
            value < config.low_threshold(nutrient) * DANGER_LOW_FACTOR
                || value > config.high_threshold(nutrient) * DANGER_HIGH_FACTOR
        });

    if danger {
        OverallStatus::Danger
    } else if Nutrient::ALL
        .iter()
        .all(|&nutrient| classify(nutrient, npk.get(nutrient), config) == NutrientStatus::Ok)
    {
        OverallStatus::Ok
    } else {
        OverallStatus::Warning
    }
}

/// Evaluate a reading into a [`StatusResult`].
///
/// The reading is expected to have passed
/// [`crate::validation::validate_reading`]. Fails only on malformed
/// configuration.
pub fn evaluate(
    reading: &InstantaneousReading,
    config: &StatusConfig,
) -> Result<StatusResult, EngineError> {
    // ---
    config.validate()?;

    Ok(StatusResult {
        n_status: classify(Nutrient::Nitrogen, reading.n, config),
        p_status: classify(Nutrient::Phosphorus, reading.p, config),
        k_status: classify(Nutrient::Potassium, reading.k, config),
        overall: overall_status(reading, config),
        recommendation: recommend(reading, config).message().to_string(),
    })
}
