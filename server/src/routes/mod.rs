//! HTTP route definitions.

mod api;
mod health;

use crate::error::AppError;
use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(api::routes())
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}
