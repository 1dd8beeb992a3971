//! Recording lab ground truth. A label can be written once; later writes
//! for the same label are refused rather than overwriting the anchor.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, info, warn};

use super::{engine_error_response, error_response, is_unique_violation, AppState};
use crate::{validation::validate_lab_sample, LabSample};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/lab/results", post(handler))
}

async fn handler(
    State(state): State<AppState>,
    Json(sample): Json<LabSample>,
) -> impl IntoResponse {
    // ---
    info!("POST /lab/results - {}", sample.sample_label);

    if sample.sample_label.trim().is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "sample_label must not be empty");
    }
    if let Err(e) = validate_lab_sample(&sample) {
        warn!("Rejected lab result {}: {}", sample.sample_label, e);
        return engine_error_response(&e);
    }

    match store_lab_result(&state.pool, &sample).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(json!({ "status": "success", "sample_label": sample.sample_label })),
        )
            .into_response(),
        Err(e) if is_unique_violation(&e) => {
            warn!("Lab result {} already recorded", sample.sample_label);
            error_response(
                StatusCode::CONFLICT,
                format!("Lab result {} already recorded", sample.sample_label),
            )
        }
        Err(e) => {
            error!("Failed to store lab result {}: {}", sample.sample_label, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store lab result")
        }
    }
}

async fn store_lab_result(pool: &PgPool, sample: &LabSample) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO lab_results (sample_bottle_label, n_val, p_val, k_val)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(&sample.sample_label)
    .bind(sample.n)
    .bind(sample.p)
    .bind(sample.k)
    .execute(pool)
    .await?;

    Ok(())
}
