//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use stockroom_engine::product::COLLECTION;

use crate::error::{AppError, Result};
use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    /// Products currently in the store
    pub products: usize,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let products = state
        .catalogue
        .store()
        .count(COLLECTION)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.app_env.clone(),
        products,
    }))
}
