//! Top-level router

pub mod receipt;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::CacheStats;
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    cache: CacheStats,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.catalog.stats(),
    })
}

/// Full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/receipts/:reference", get(receipt::show))
        .nest("/api", crate::pricing::router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
