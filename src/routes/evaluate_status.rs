//! Ad-hoc status evaluation: the caller supplies a reading and optional
//! threshold overrides, which are layered on the service defaults.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{engine_error_response, AppState};
use crate::{
    status::{self, StatusOverrides},
    validation::validate_reading,
    EngineError, InstantaneousReading, StatusConfig, StatusResult,
};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/status", post(handler))
}

/// Request body: the reading fields inline plus an optional `overrides` object.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(flatten)]
    reading: InstantaneousReading,
    #[serde(default)]
    overrides: StatusOverrides,
}

async fn handler(
    State(state): State<AppState>,
    Json(request): Json<StatusRequest>,
) -> impl IntoResponse {
    // ---
    info!("POST /status");

    match evaluate_request(&request, &state.config.status) {
        Ok(result) => {
            debug!("Status {:?}: {}", result.overall, result.recommendation);
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            warn!("Rejected status request: {}", e);
            engine_error_response(&e)
        }
    }
}

fn evaluate_request(
    request: &StatusRequest,
    defaults: &StatusConfig,
) -> Result<StatusResult, EngineError> {
    // ---
    validate_reading(&request.reading)?;
    let config = defaults.with_overrides(&request.overrides);
    status::evaluate(&request.reading, &config)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::OverallStatus;

    fn parse(body: &str) -> StatusRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_request_without_overrides() {
        // ---
        let request = parse(r#"{"n": 150, "p": 50, "k": 200, "ph": 6.2, "ec": 1.2}"#);
        let result = evaluate_request(&request, &StatusConfig::default()).unwrap();
        assert_eq!(result.overall, OverallStatus::Ok);
        assert_eq!(result.recommendation, "System healthy. No action required.");
    }

    #[test]
    fn test_request_with_overrides() {
        // ---
        let request = parse(
            r#"{"n": 150, "p": 50, "k": 200, "ph": 6.2, "ec": 1.2,
                "overrides": {"ecLow": 1.5, "ecHigh": 3.0}}"#,
        );
        let result = evaluate_request(&request, &StatusConfig::default()).unwrap();
        assert_eq!(result.recommendation, "Solution is too weak. Add balanced nutrient mix.");
    }

    #[test]
    fn test_request_rejects_negative_reading() {
        // ---
        let request = parse(r#"{"n": -1, "p": 50, "k": 200, "ph": 6.2, "ec": 1.2}"#);
        let err = evaluate_request(&request, &StatusConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::OutOfRangeInput { .. }));
    }

    #[test]
    fn test_request_rejects_bad_overrides() {
        // ---
        let request = parse(
            r#"{"n": 150, "p": 50, "k": 200, "ph": 6.2, "ec": 1.2,
                "overrides": {"phLow": 8.0}}"#,
        );
        let err = evaluate_request(&request, &StatusConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }
}
