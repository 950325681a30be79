//! Liveness endpoint
//!
//! Reports that the process is up. The database is not consulted.

use axum::{routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
}

/// GET /status, GET /health
async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: "Database agent is running",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Health routes
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/status", get(status))
        .route("/health", get(status))
}
