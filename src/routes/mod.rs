//! Route gateway (EMBP): each sibling module exports a subrouter and this
//! file merges them under one shared [`AppState`].

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde_json::json;
use sqlx::PgPool;

use crate::{Config, EngineError, Oracle};

mod evaluate_status;
mod health;
mod history;
mod lab_results;
mod latest_status;
mod training_dataset;
mod upload_reading;

// ---

/// State shared by every handler. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub oracle: Oracle,
}

pub fn router(pool: PgPool, config: Config, oracle: Oracle) -> Router {
    // ---
    Router::new()
        .merge(upload_reading::router())
        .merge(lab_results::router())
        .merge(latest_status::router())
        .merge(history::router())
        .merge(evaluate_status::router())
        .merge(training_dataset::router())
        .merge(health::router())
        .with_state(AppState {
            pool,
            config,
            oracle,
        })
}

// ---

/// JSON `{"error": msg}` with the given status code.
pub(crate) fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(json!({ "error": msg.into() }))).into_response()
}

/// Engine errors are caller mistakes (bad input or bad overrides).
pub(crate) fn engine_error_response(e: &EngineError) -> Response {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
