use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, items, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Items
        .route("/items", post(items::submit_item))
        .route("/items", get(items::list_items))
        .route("/items/{id}", get(items::get_item))
        // Pipeline
        .route("/stats", get(handlers::get_stats))
        .route("/schedule", get(handlers::get_schedule))
        // Metrics
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}
