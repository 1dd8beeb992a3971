//! Training dataset export.
//!
//! Loads every daily reading and lab result, reconstructs NPK per bucket,
//! and returns the image/NPK pairs the model trainer consumes. Readings
//! without an image are dropped since they cannot be trained on.

use std::collections::HashMap;

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, error, info, warn};

use super::{error_response, AppState};
use crate::{
    reconstruction::{index_samples, reconstruct_all},
    DailyReadingRow, LabResultRow, LabSample, ReadingSource,
};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/training/dataset", get(handler))
}

#[derive(Debug, Deserialize)]
pub struct DatasetQuery {
    bucket_label: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct DatasetRow {
    record_id: i64,
    timestamp: DateTime<Utc>,
    image_url: String,
    n_val: f64,
    p_val: f64,
    k_val: f64,
    source: ReadingSource,
}

#[derive(Debug, Serialize, PartialEq)]
struct ContextDataset {
    bucket_label: String,
    anchors: usize,
    insufficient_anchors: bool,
    error: Option<String>,
    rows: Vec<DatasetRow>,
}

async fn handler(
    Query(params): Query<DatasetQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /training/dataset - bucket {:?}", params.bucket_label);

    // Step 1: Load readings and ground truth
    debug!("GET /training/dataset - Step 1");

    let readings = match fetch_readings(&state.pool, params.bucket_label.as_deref()).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to load daily readings: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load readings");
        }
    };
    let lab = match fetch_lab_results(&state.pool).await {
        Ok(rows) => rows.iter().map(LabResultRow::to_sample).collect::<Vec<_>>(),
        Err(e) => {
            error!("Failed to load lab results: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load lab results");
        }
    };

    // Step 2: Reconstruct per bucket
    debug!("GET /training/dataset - Step 2");

    let dataset = build_dataset(&readings, &lab);
    let total: usize = dataset.iter().map(|c| c.rows.len()).sum();
    info!(
        "Dataset ready: {} rows across {} buckets",
        total,
        dataset.len()
    );
    (StatusCode::OK, Json(dataset)).into_response()
}

fn build_dataset(readings: &[DailyReadingRow], lab: &[LabSample]) -> Vec<ContextDataset> {
    // ---
    let records: Vec<_> = readings.iter().map(DailyReadingRow::to_record).collect();
    let images: HashMap<i64, &str> = readings
        .iter()
        .filter_map(|r| r.image_path.as_deref().map(|p| (r.id, p)))
        .collect();
    let samples = index_samples(lab);

    reconstruct_all(&records, &samples)
        .into_iter()
        .map(|ctx| match ctx.result {
            Ok(reconstruction) => {
                let insufficient = reconstruction.insufficient_anchors();
                if let Some(e) = &insufficient {
                    warn!("Bucket {}: {}", ctx.context, e);
                }
                let rows = reconstruction
                    .readings
                    .iter()
                    .filter_map(|r| {
                        images.get(&r.record_id).map(|image| DatasetRow {
                            record_id: r.record_id,
                            timestamp: r.timestamp,
                            image_url: image.replace('\\', "/"),
                            n_val: r.n,
                            p_val: r.p,
                            k_val: r.k,
                            source: r.source,
                        })
                    })
                    .collect();
                ContextDataset {
                    bucket_label: ctx.context,
                    anchors: reconstruction.anchor_count,
                    insufficient_anchors: insufficient.is_some(),
                    error: None,
                    rows,
                }
            }
            Err(e) => {
                error!("Bucket {}: reconstruction failed: {}", ctx.context, e);
                ContextDataset {
                    bucket_label: ctx.context,
                    anchors: 0,
                    insufficient_anchors: false,
                    error: Some(e.to_string()),
                    rows: Vec::new(),
                }
            }
        })
        .collect()
}

async fn fetch_readings(
    pool: &PgPool,
    bucket_label: Option<&str>,
) -> Result<Vec<DailyReadingRow>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, DailyReadingRow>(
        r#"
        SELECT r.id, e.bucket_label, r.timestamp, r.image_path, r.sample_bottle_label
        FROM daily_readings r
        JOIN experiments e ON e.id = r.bucket_id
        WHERE ($1::TEXT IS NULL OR e.bucket_label = $1)
        ORDER BY e.bucket_label, r.timestamp ASC
        "#,
    )
    .bind(bucket_label)
    .fetch_all(pool)
    .await
}

async fn fetch_lab_results(pool: &PgPool) -> Result<Vec<LabResultRow>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, LabResultRow>(
        "SELECT sample_bottle_label, n_val, p_val, k_val FROM lab_results",
    )
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{Duration, TimeZone};

    fn create_test_rows(bucket: &str, days: i64, lab_days: &[i64]) -> Vec<DailyReadingRow> {
        // ---
        let start = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        (1..=days)
            .map(|day| DailyReadingRow {
                id: day,
                bucket_label: bucket.to_string(),
                timestamp: start + Duration::days(day),
                image_path: (day != 3).then(|| format!("images\\sim_{bucket}_day{day:02}.jpg")),
                sample_bottle_label: lab_days
                    .contains(&day)
                    .then(|| format!("{bucket}-Day{day}")),
            })
            .collect()
    }

    fn lab(label: &str, n: f64) -> LabSample {
        LabSample {
            sample_label: label.to_string(),
            n,
            p: 50.0,
            k: 200.0,
        }
    }

    #[test]
    fn test_dataset_interpolates_and_drops_imageless() {
        // ---
        let rows = create_test_rows("BucketA", 7, &[1, 5]);
        let samples = vec![lab("BucketA-Day1", 100.0), lab("BucketA-Day5", 140.0)];

        let dataset = build_dataset(&rows, &samples);
        assert_eq!(dataset.len(), 1);

        let bucket = &dataset[0];
        assert_eq!(bucket.anchors, 2);
        assert!(!bucket.insufficient_anchors);

        // Days 1..=5 reconstructed, day 3 has no image
        let ids: Vec<i64> = bucket.rows.iter().map(|r| r.record_id).collect();
        assert_eq!(ids, vec![1, 2, 4, 5]);
        assert_eq!(bucket.rows[1].n_val, 110.0);
        assert_eq!(bucket.rows[2].n_val, 130.0);
        assert_eq!(bucket.rows[0].image_url, "images/sim_BucketA_day01.jpg");
    }

    #[test]
    fn test_dataset_flags_insufficient_anchors() {
        // ---
        let rows = create_test_rows("BucketF-LowP", 4, &[2]);
        let samples = vec![lab("BucketF-LowP-Day2", 150.0)];

        let dataset = build_dataset(&rows, &samples);
        assert!(dataset[0].insufficient_anchors);
        assert!(dataset[0].rows.is_empty());
        assert!(dataset[0].error.is_none());
    }
}
