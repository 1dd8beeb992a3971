use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, info};

use super::{error_response, AppState};
use crate::PredictedReading;

// ---

const DEFAULT_LIMIT: u32 = 30;
const MAX_LIMIT: u32 = 1000;

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/app/history", get(handler))
}

/// Query parameters for the history chart
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<u32>,
}

/// One chart point: sensors plus predicted NPK.
#[derive(Debug, Serialize, PartialEq)]
struct HistoryPoint {
    timestamp: DateTime<Utc>,
    ph: f64,
    ec: f64,
    temp: f64,
    n_ppm: f64,
    p_ppm: f64,
    k_ppm: f64,
}

impl From<&PredictedReading> for HistoryPoint {
    fn from(row: &PredictedReading) -> Self {
        HistoryPoint {
            timestamp: row.timestamp,
            ph: row.ph,
            ec: row.ec,
            temp: row.water_temp,
            n_ppm: row.predicted_n,
            p_ppm: row.predicted_p,
            k_ppm: row.predicted_k,
        }
    }
}

async fn handler(
    Query(params): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    let limit = effective_limit(params.limit);
    info!("GET /app/history - limit {}", limit);

    match fetch_recent(&state.pool, limit).await {
        Ok(rows) => (StatusCode::OK, Json(chronological(&rows))).into_response(),
        Err(e) => {
            error!("Failed to load history: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load history")
        }
    }
}

/// `limit=0` is honored and yields an empty history.
fn effective_limit(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
}

/// Rows arrive newest first; charts want oldest first.
fn chronological(rows: &[PredictedReading]) -> Vec<HistoryPoint> {
    rows.iter().rev().map(HistoryPoint::from).collect()
}

async fn fetch_recent(pool: &PgPool, limit: u32) -> Result<Vec<PredictedReading>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, PredictedReading>(
        r#"
        SELECT r.id AS reading_id, r.timestamp, r.image_path, r.ph, r.ec, r.water_temp,
               p.predicted_n, p.predicted_p, p.predicted_k, p.prediction_date
        FROM daily_readings r
        JOIN npk_predictions p ON p.daily_reading_id = r.id
        ORDER BY r.timestamp DESC
        LIMIT $1
        "#,
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_limit_defaults_and_clamps() {
        // ---
        assert_eq!(effective_limit(None), 30);
        assert_eq!(effective_limit(Some(0)), 0);
        assert_eq!(effective_limit(Some(50)), 50);
        assert_eq!(effective_limit(Some(100_000)), 1000);
    }

    #[test]
    fn test_history_is_oldest_first() {
        // ---
        let start = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let rows: Vec<PredictedReading> = (0..3)
            .rev()
            .map(|day| PredictedReading {
                reading_id: day,
                timestamp: start + Duration::days(day),
                image_path: None,
                ph: 6.0,
                ec: 1.0,
                water_temp: 22.0,
                predicted_n: 100.0 + day as f64,
                predicted_p: 50.0,
                predicted_k: 200.0,
                prediction_date: start + Duration::days(day),
            })
            .collect();

        let points = chronological(&rows);
        let n: Vec<f64> = points.iter().map(|p| p.n_ppm).collect();
        assert_eq!(n, vec![100.0, 101.0, 102.0]);
        assert!(points[0].timestamp < points[2].timestamp);
    }
}
