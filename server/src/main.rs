//! Stockroom Server - HTTP front end for the product catalogue.
//!
//! Exposes the engine's product operations under `/api/Product/{method}` and
//! answers every call with the JSON response envelope.

mod config;
mod error;
mod handlers;
mod routes;

use crate::config::Config;
use crate::handlers::Catalogue;
use axum::Router;
use std::sync::Arc;
use stockroom_engine::product::{sample_products, COLLECTION};
use stockroom_engine::{MemoryStore, ProductService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalogue: Arc<Catalogue>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockroom_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(
        "Starting Stockroom Server on {}:{} ({})",
        config.host,
        config.port,
        config.app_env
    );

    // Build the store
    let store = if config.seed_sample_data {
        tracing::info!("Seeding sample catalogue");
        MemoryStore::seeded(COLLECTION, sample_products())
    } else {
        MemoryStore::new()
    };
    let catalogue = ProductService::new(Arc::new(store)).with_debug(config.debug);

    // Build application state
    let state = AppState {
        catalogue: Arc::new(catalogue),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
