use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Renders currently holding an admission slot.
    pub renders_in_flight: usize,
    /// Configured admission capacity.
    pub render_capacity: usize,
}

/// GET /health -- liveness plus current render load.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let gate = state.dispatcher.gate();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        renders_in_flight: gate.in_flight(),
        render_capacity: gate.capacity(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
