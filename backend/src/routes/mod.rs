//! Route definitions for the irrigation advisory API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/farms", farm_routes())
}

/// Farm advisory routes
fn farm_routes() -> Router<AppState> {
    Router::new().route("/advisory", post(handlers::submit_farm_advisory))
}
