// src/routes/health.rs
//! Liveness endpoint for the LEAFCLOUD backend.
//!
//! `/health` lets container orchestrators and CI confirm the process is up
//! and answering HTTP. It never touches the database, the oracle, or the
//! engines, so a slow Postgres does not make the service look dead.
//!
//! Exports a generic subrouter that the gateway (`mod.rs`) merges.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Subrouter with the `/health` route, generic over the gateway state `S`.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
