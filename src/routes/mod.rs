use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::{Cache, MovieStore};
use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod movies;
pub mod recommendations;

/// Shared state behind the read-only movie routes
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MovieStore>,
    pub cache: Cache,
}

/// Creates the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/movies", get(movies::search))
        .route("/movies/:id", get(movies::detail))
        .route(
            "/movies/:id/recommendations",
            get(recommendations::recommend),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
