//! Data models for the nutrient pipeline.
//!
//! Engine-facing types (`DailyRecord`, `LabSample`, `InstantaneousReading`,
//! `ReconstructedReading`, `StatusResult`) are plain values with no
//! persistence semantics. Row types at the bottom mirror the storage tables
//! and convert into engine types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Nitrogen, phosphorus and potassium concentrations in ppm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Npk {
    // ---
    pub n: f64,
    pub p: f64,
    pub k: f64,
}

impl Npk {
    // ---
    pub fn new(n: f64, p: f64, k: f64) -> Self {
        Npk { n, p, k }
    }

    /// Value of one nutrient dimension.
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.n,
            Nutrient::Phosphorus => self.p,
            Nutrient::Potassium => self.k,
        }
    }
}

/// One of the three tracked nutrients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::Nitrogen, Nutrient::Phosphorus, Nutrient::Potassium];
}

/// One day in a monitoring context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    // ---
    /// Opaque identifier of the stored reading.
    pub id: i64,
    /// Device/bucket label grouping records into one context.
    pub context: String,
    pub timestamp: DateTime<Utc>,
    /// Set iff a lab sample was physically taken that day.
    pub sample_label: Option<String>,
}

/// Laboratory ground truth for one sampled day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabSample {
    // ---
    pub sample_label: String,
    pub n: f64,
    pub p: f64,
    pub k: f64,
}

impl LabSample {
    // ---
    pub fn npk(&self) -> Npk {
        Npk::new(self.n, self.p, self.k)
    }
}

/// Where a reconstructed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    /// Copied verbatim from a lab sample.
    Anchor,
    /// Linearly interpolated between the two nearest anchors.
    Interpolated,
}

/// Reconstructed NPK estimate for one daily record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconstructedReading {
    // ---
    pub record_id: i64,
    pub timestamp: DateTime<Utc>,
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub source: ReadingSource,
}

/// Instantaneous sensor/nutrient reading evaluated by the status engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantaneousReading {
    // ---
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub ph: f64,
    pub ec: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl InstantaneousReading {
    // ---
    pub fn new(npk: Npk, ph: f64, ec: f64) -> Self {
        InstantaneousReading {
            n: npk.n,
            p: npk.p,
            k: npk.k,
            ph,
            ec,
            timestamp: None,
        }
    }

    pub fn npk(&self) -> Npk {
        Npk::new(self.n, self.p, self.k)
    }
}

/// Per-nutrient classification against the optimal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientStatus {
    Low,
    Ok,
    High,
}

/// Aggregate status across all nutrients and pH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Ok,
    Warning,
    Danger,
}

/// Output of the status engine, serialized directly into API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    // ---
    pub n_status: NutrientStatus,
    pub p_status: NutrientStatus,
    pub k_status: NutrientStatus,
    pub overall: OverallStatus,
    pub recommendation: String,
}

// ---

/// Sensor payload posted by the IoT device.
#[derive(Debug, Deserialize)]
pub struct IotReading {
    // ---
    #[serde(default = "default_bucket_label")]
    pub bucket_label: String,
    pub ph: f64,
    pub ec: f64,
    pub temp: f64,
    /// Reference to an image already written by the capture service.
    pub image_url: Option<String>,
    pub sample_label: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

fn default_bucket_label() -> String {
    "unknown".to_string()
}

/// Daily reading joined with its experiment label, as loaded for reconstruction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyReadingRow {
    // ---
    pub id: i64,
    pub bucket_label: String,
    pub timestamp: DateTime<Utc>,
    pub image_path: Option<String>,
    pub sample_bottle_label: Option<String>,
}

impl DailyReadingRow {
    // ---
    pub fn to_record(&self) -> DailyRecord {
        DailyRecord {
            id: self.id,
            context: self.bucket_label.clone(),
            timestamp: self.timestamp,
            sample_label: self.sample_bottle_label.clone(),
        }
    }
}

/// Stored lab result row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LabResultRow {
    // ---
    pub sample_bottle_label: String,
    pub n_val: f64,
    pub p_val: f64,
    pub k_val: f64,
}

impl LabResultRow {
    // ---
    pub fn to_sample(&self) -> LabSample {
        LabSample {
            sample_label: self.sample_bottle_label.clone(),
            n: self.n_val,
            p: self.p_val,
            k: self.k_val,
        }
    }
}

/// Daily reading joined with its NPK prediction.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PredictedReading {
    // ---
    pub reading_id: i64,
    pub timestamp: DateTime<Utc>,
    pub image_path: Option<String>,
    pub ph: f64,
    pub ec: f64,
    pub water_temp: f64,
    pub predicted_n: f64,
    pub predicted_p: f64,
    pub predicted_k: f64,
    pub prediction_date: DateTime<Utc>,
}

impl PredictedReading {
    // ---
    pub fn to_instantaneous(&self) -> InstantaneousReading {
        InstantaneousReading {
            n: self.predicted_n,
            p: self.predicted_p,
            k: self.predicted_k,
            ph: self.ph,
            ec: self.ec,
            timestamp: Some(self.prediction_date),
        }
    }

    /// Image path with Windows separators normalized for URLs.
    pub fn image_url(&self) -> Option<String> {
        self.image_path.as_ref().map(|p| p.replace('\\', "/"))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn create_test_predicted(n: f64, ph: f64) -> PredictedReading {
        // ---
        let ts = Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap();
        PredictedReading {
            reading_id: 7,
            timestamp: ts,
            image_path: Some("images\\sim_BucketA_day01.jpg".to_string()),
            ph,
            ec: 1.2,
            water_temp: 24.0,
            predicted_n: n,
            predicted_p: 50.0,
            predicted_k: 200.0,
            prediction_date: ts,
        }
    }

    #[test]
    fn test_npk_dimension_access() {
        // ---
        let npk = Npk::new(1.0, 2.0, 3.0);
        assert_eq!(npk.get(Nutrient::Nitrogen), 1.0);
        assert_eq!(npk.get(Nutrient::Phosphorus), 2.0);
        assert_eq!(npk.get(Nutrient::Potassium), 3.0);
    }

    #[test]
    fn test_predicted_reading_conversion() {
        // ---
        let row = create_test_predicted(140.0, 6.1);
        let reading = row.to_instantaneous();

        assert_eq!(reading.n, 140.0);
        assert_eq!(reading.p, 50.0);
        assert_eq!(reading.k, 200.0);
        assert_eq!(reading.ph, 6.1);
        assert_eq!(reading.ec, 1.2);
        assert_eq!(reading.timestamp, Some(row.prediction_date));
    }

    #[test]
    fn test_image_url_normalization() {
        // ---
        let row = create_test_predicted(150.0, 6.0);
        assert_eq!(
            row.image_url().as_deref(),
            Some("images/sim_BucketA_day01.jpg")
        );
    }

    #[test]
    fn test_row_to_record_preserves_label() {
        // ---
        let row = DailyReadingRow {
            id: 3,
            bucket_label: "BucketB-LowN".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap(),
            image_path: None,
            sample_bottle_label: Some("BucketB-LowN-Day5".to_string()),
        };

        let record = row.to_record();
        assert_eq!(record.id, 3);
        assert_eq!(record.context, "BucketB-LowN");
        assert_eq!(record.sample_label.as_deref(), Some("BucketB-LowN-Day5"));
    }

    #[test]
    fn test_status_result_serializes_camel_case() {
        // ---
        let result = StatusResult {
            n_status: NutrientStatus::Low,
            p_status: NutrientStatus::Ok,
            k_status: NutrientStatus::High,
            overall: OverallStatus::Warning,
            recommendation: "x".to_string(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["nStatus"], "low");
        assert_eq!(json["pStatus"], "ok");
        assert_eq!(json["kStatus"], "high");
        assert_eq!(json["overall"], "warning");
    }

    #[test]
    fn test_iot_reading_defaults_bucket() {
        // ---
        let raw: IotReading = serde_json::from_str(r#"{"ph": 6.0, "ec": 1.1, "temp": 23.5}"#).unwrap();
        assert_eq!(raw.bucket_label, "unknown");
        assert!(raw.image_url.is_none());
        assert!(raw.sample_label.is_none());
    }
}
