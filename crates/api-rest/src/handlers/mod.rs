//! Route handlers, grouped by resource.

pub mod admin;
pub mod assets;
pub mod auth;
pub mod clinical;
pub mod coordinator;
pub mod files;
pub mod investigations;
pub mod observations;
pub mod patients;
pub mod sessions;

use crate::{ApiError, AppState};
use api_shared::{HealthRes, HealthService};
use axum::extract::State;
use axum::Json;

/// Maps a raw store failure through the core error taxonomy (logged 500).
pub(crate) fn store_err(err: simward_core::StoreError) -> ApiError {
    simward_core::CoreError::from(err).into()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint.
///
/// Used for monitoring and load balancer health checks.
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}
