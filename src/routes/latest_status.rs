//! Dashboard endpoint for the mobile app: the most recent prediction,
//! evaluated against the service's configured thresholds.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, info};

use super::{error_response, AppState};
use crate::{status, PredictedReading, StatusConfig, StatusResult};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/app/latest_status", get(handler))
}

#[derive(Debug, Serialize)]
struct Sensors {
    ph: f64,
    ec: f64,
    temp: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct NpkLevels {
    nitrogen: f64,
    phosphorus: f64,
    potassium: f64,
}

#[derive(Debug, Serialize)]
struct LatestStatus {
    timestamp: DateTime<Utc>,
    status: StatusResult,
    recommendation: String,
    image_url: Option<String>,
    sensors: Sensors,
    npk_levels: NpkLevels,
}

async fn handler(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    info!("GET /app/latest_status");

    let latest = match fetch_latest(&state.pool).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            return (StatusCode::OK, Json(json!({ "error": "No data available yet" })))
                .into_response();
        }
        Err(e) => {
            error!("Failed to load latest prediction: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load status");
        }
    };

    match build_status(&latest, &state.config.status) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            error!("Status evaluation failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn build_status(
    row: &PredictedReading,
    config: &StatusConfig,
) -> Result<LatestStatus, crate::EngineError> {
    // ---
    let result = status::evaluate(&row.to_instantaneous(), config)?;

    Ok(LatestStatus {
        timestamp: row.prediction_date,
        recommendation: result.recommendation.clone(),
        status: result,
        image_url: row.image_url(),
        sensors: Sensors {
            ph: row.ph,
            ec: row.ec,
            temp: row.water_temp,
        },
        npk_levels: NpkLevels {
            nitrogen: row.predicted_n,
            phosphorus: row.predicted_p,
            potassium: row.predicted_k,
        },
    })
}

async fn fetch_latest(pool: &PgPool) -> Result<Option<PredictedReading>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, PredictedReading>(
        r#"
        SELECT r.id AS reading_id, r.timestamp, r.image_path, r.ph, r.ec, r.water_temp,
               p.predicted_n, p.predicted_p, p.predicted_k, p.prediction_date
        FROM npk_predictions p
        JOIN daily_readings r ON r.id = p.daily_reading_id
        ORDER BY p.prediction_date DESC, p.id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_build_status_shape() {
        // ---
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let row = PredictedReading {
            reading_id: 1,
            timestamp: ts,
            image_path: Some("images\\day01.jpg".to_string()),
            ph: 6.2,
            ec: 1.2,
            water_temp: 23.0,
            predicted_n: 150.0,
            predicted_p: 50.0,
            predicted_k: 200.0,
            prediction_date: ts,
        };

        let body = build_status(&row, &StatusConfig::default()).unwrap();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["recommendation"], "System healthy. No action required.");
        assert_eq!(json["status"]["overall"], "ok");
        assert_eq!(json["image_url"], "images/day01.jpg");
        assert_eq!(json["sensors"]["temp"], 23.0);
        assert_eq!(json["npk_levels"]["Nitrogen"], 150.0);
        assert_eq!(json["npk_levels"]["Potassium"], 200.0);
    }
}
