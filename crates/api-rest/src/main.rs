//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when you only want the REST server
//! (with OpenAPI/Swagger UI). The workspace's main `simward-run` binary is
//! the production entry point and wires the same router.

use api_rest::{router, ApiDoc, AppState};
use simward_core::{AppConfig, MemoryStore};
use simward_files::BlobStore;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Main entry point for the simward REST API server.
///
/// # Environment Variables
/// - `SIMWARD_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `SIMWARD_DATA_DIR`: Blob storage directory (default: "./simward_data")
/// - `SIMWARD_SEED_FILE`: Optional JSON seed file loaded at startup
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the blob store or seed file cannot be opened, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("simward_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::from_env()?;

    tracing::info!("-- Starting simward REST API on {}", cfg.addr());

    let store = match cfg.seed_file() {
        Some(path) => {
            let snapshot = simward_core::seed::load_snapshot(path)?;
            tracing::info!("-- Loaded seed data from {}", path.display());
            MemoryStore::from_snapshot(snapshot)
        }
        None => MemoryStore::new(),
    };

    let blobs = BlobStore::open(cfg.data_dir())?;
    let state = AppState::new(Arc::new(store), Arc::new(blobs));

    let app = router(state)
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(cfg.addr()).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
