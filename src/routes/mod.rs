use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::storage::MeasurementStore;

mod health;
mod measurements;

/// Shared state of every handler: the process-wide storage handle.
pub type AppState = Arc<dyn MeasurementStore>;

// ---

pub fn router(store: AppState) -> Router {
    // ---
    Router::new()
        .merge(measurements::router())
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
