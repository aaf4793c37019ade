// src/routes/health.rs
//! Health check endpoint.
//!
//! `GET /health` answers `{"status":"ok"}` when the storage handle responds
//! to a ping, and `503 {"status":"unavailable"}` otherwise. Orchestrators
//! use it as a readiness probe.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
async fn health(State(store): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Err(e) => {
            tracing::warn!("Health check failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                }),
            )
        }
    }
}

/// Subrouter containing the `/health` route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
