//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Symbols in the loaded catalog; zero means degraded mode.
    pub catalog_size: usize,
    /// Listings held in cache, fresh or stale.
    pub cached_listings: usize,
    pub uptime_secs: u64,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let catalog_size = state.service.catalog().len();

    Json(HealthResponse {
        status: if catalog_size > 0 { "healthy" } else { "degraded" },
        catalog_size,
        cached_listings: state.service.cached_listings(),
        uptime_secs: state.uptime_secs(),
    })
}
