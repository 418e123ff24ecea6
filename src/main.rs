//! Main entry point for the simward platform server.
//!
//! Wires the in-memory entity store, the blob store, and the REST router
//! into one process. Configuration is resolved from the environment once at
//! startup.
//!
//! # Environment Variables
//! - `SIMWARD_ADDR`: REST server address (default: "0.0.0.0:3000")
//! - `SIMWARD_DATA_DIR`: Blob storage directory (default: "./simward_data")
//! - `SIMWARD_SEED_FILE`: Optional JSON seed file loaded into the store at
//!   startup (the `simward seed generate` CLI produces one)
//! - `RUST_LOG`: Tracing filter, e.g. `simward=debug`

use api_rest::{router, ApiDoc, AppState};
use simward_core::{AppConfig, MemoryStore};
use simward_files::BlobStore;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("simward=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("simward_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::from_env()?;

    tracing::info!("++ Starting simward on {}", cfg.addr());
    tracing::info!("++ Blob storage under {}", cfg.data_dir().display());

    let store = match cfg.seed_file() {
        Some(path) => {
            let snapshot = simward_core::seed::load_snapshot(path)?;
            let problems = simward_core::seed::check_snapshot(&snapshot);
            for problem in &problems {
                tracing::warn!("seed: {}", problem);
            }
            tracing::info!(
                "++ Seeded {} users, {} patients from {}",
                snapshot.users.len(),
                snapshot.patients.len(),
                path.display()
            );
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
