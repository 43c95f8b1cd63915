//! Axum application builder.

use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{etfs, health};
use crate::state::AppState;

/// Create the Axum application with all routes.
pub fn create_app(state: AppState) -> Router {
    // The PWA front end is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/etfs", get(etfs::list_etfs))
        .route("/api/etfs/compare", post(etfs::compare))
        .route("/api/etfs/{ticker}", get(etfs::get_details))
        .route("/api/etfs/{ticker}/performance", get(etfs::get_performance))
        .route("/api/etfs/{ticker}/history", get(etfs::get_history))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
