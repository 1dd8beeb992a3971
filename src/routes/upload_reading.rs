use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};

use super::{engine_error_response, error_response, is_unique_violation, AppState};
use crate::{validation::validate_sensor, EngineError, IotReading, Npk};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/iot/readings", post(handler))
}

async fn handler(
    State(state): State<AppState>,
    Json(raw): Json<IotReading>,
) -> impl IntoResponse {
    // ---
    info!("POST /iot/readings - bucket {}", raw.bucket_label);

    // Step 1: Reject bad sensor values before touching storage
    debug!("POST /iot/readings - Step 1");

    if let Err(e) = validate_upload(&raw) {
        warn!("Rejected reading for {}: {}", raw.bucket_label, e);
        return engine_error_response(&e);
    }

    // Step 2: Find or create the experiment and store the reading
    debug!("POST /iot/readings - Step 2");

    let experiment_id = match find_or_create_experiment(&state.pool, &raw.bucket_label).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to resolve experiment {}: {}", raw.bucket_label, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store reading");
        }
    };

    let reading_id = match store_daily_reading(&state.pool, experiment_id, &raw).await {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            warn!("Duplicate reading for {} at {:?}", raw.bucket_label, raw.timestamp);
            return error_response(
                StatusCode::CONFLICT,
                "A reading already exists at this timestamp",
            );
        }
        Err(e) => {
            error!("Failed to store reading: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store reading");
        }
    };

    // Step 3: Ask the oracle for NPK when an image was captured
    debug!("POST /iot/readings - Step 3");

    let prediction = match raw.image_url.as_deref() {
        Some(image_url) => match state.oracle.predict(image_url).await {
            Ok(npk) => Some(npk),
            Err(e) => {
                error!("Prediction failed for reading {}: {}", reading_id, e);
                None
            }
        },
        None => None,
    };

    // Only report a prediction that actually reached storage
    let prediction = match prediction {
        Some(npk) => store_prediction(&state.pool, reading_id, &npk)
            .await
            .map(|_| npk)
            .map_err(|e| error!("Failed to store prediction for reading {}: {}", reading_id, e))
            .ok(),
        None => None,
    };

    info!(
        "Stored reading {} for {} (prediction: {})",
        reading_id,
        raw.bucket_label,
        prediction.is_some()
    );
    (StatusCode::OK, Json(upload_response(reading_id, prediction))).into_response()
}

// ---

/// Response body; the message says whether NPK was stored with the reading.
fn upload_response(reading_id: i64, prediction: Option<Npk>) -> serde_json::Value {
    // ---
    let message = if prediction.is_some() {
        "Data processed and NPK calculated"
    } else {
        "Data stored without NPK prediction"
    };

    json!({
        "status": "success",
        "message": message,
        "reading_id": reading_id,
        "prediction": prediction,
    })
}

fn validate_upload(raw: &IotReading) -> Result<(), EngineError> {
    // ---
    validate_sensor("ph", raw.ph)?;
    validate_sensor("ec", raw.ec)?;
    validate_sensor("temp", raw.temp)?;
    Ok(())
}

/// Look up the experiment for a bucket label, creating it on first use.
async fn find_or_create_experiment(pool: &PgPool, bucket_label: &str) -> Result<i64, sqlx::Error> {
    // ---
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO experiments (bucket_label, start_date)
        VALUES ($1, CURRENT_DATE)
        ON CONFLICT (bucket_label) DO UPDATE SET bucket_label = EXCLUDED.bucket_label
        RETURNING id
        "#,
    )
    .bind(bucket_label)
    .fetch_one(pool)
    .await
}

async fn store_daily_reading(
    pool: &PgPool,
    experiment_id: i64,
    raw: &IotReading,
) -> Result<i64, sqlx::Error> {
    // ---
    let timestamp: Option<DateTime<Utc>> = raw.timestamp;

    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO daily_readings (
            bucket_id, timestamp, image_path, ph, ec, water_temp, sample_bottle_label
        ) VALUES ($1, COALESCE($2, now()), $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(experiment_id)
    .bind(timestamp)
    .bind(&raw.image_url)
    .bind(raw.ph)
    .bind(raw.ec)
    .bind(raw.temp)
    .bind(&raw.sample_label)
    .fetch_one(pool)
    .await
}

async fn store_prediction(pool: &PgPool, reading_id: i64, npk: &Npk) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO npk_predictions (daily_reading_id, predicted_n, predicted_p, predicted_k)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(reading_id)
    .bind(npk.n)
    .bind(npk.p)
    .bind(npk.k)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn create_test_upload(ph: f64, ec: f64, temp: f64) -> IotReading {
        IotReading {
            bucket_label: "BucketA-Balanced".to_string(),
            ph,
            ec,
            temp,
            image_url: None,
            sample_label: None,
            timestamp: None,
        }
    }

    #[test]
    fn test_valid_upload_passes() {
        // ---
        assert!(validate_upload(&create_test_upload(6.0, 1.2, 24.0)).is_ok());
    }

    #[test]
    fn test_response_with_stored_prediction() {
        // ---
        let body = upload_response(12, Some(Npk::new(150.0, 50.0, 200.0)));
        assert_eq!(body["status"], "success");
        assert_eq!(body["reading_id"], 12);
        assert_eq!(body["message"], "Data processed and NPK calculated");
        assert_eq!(body["prediction"]["n"], 150.0);
    }

    #[test]
    fn test_response_without_prediction() {
        // ---
        // Oracle or prediction insert failed: reading kept, no NPK claimed
        let body = upload_response(12, None);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Data stored without NPK prediction");
        assert!(body["prediction"].is_null());
    }

    #[test]
    fn test_upload_rejects_bad_sensors() {
        // ---
        let err = validate_upload(&create_test_upload(f64::NAN, 1.2, 24.0)).unwrap_err();
        assert!(matches!(err, EngineError::OutOfRangeInput { ref field, .. } if field == "ph"));

        let err = validate_upload(&create_test_upload(6.0, 1.2, -3.0)).unwrap_err();
        assert_eq!(err, EngineError::out_of_range("temp", -3.0));
    }
}
