//! # API REST
//!
//! REST API implementation for simward.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Status-code mapping of core errors
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, CORS, pagination)
//!
//! Uses `api-shared` for wire DTOs and `simward-core` for all domain logic.

#![warn(rust_2018_idioms)]

pub mod context;
pub mod handlers;

use api_shared::ErrorBody;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use simward_core::investigations::InvestigationService;
use simward_core::observations::ObservationService;
use simward_core::{CoreError, EntityStore, VisibilityService};
use simward_files::{BlobStore, FilesError};
use std::sync::Arc;
use utoipa::OpenApi;

/// Application state shared across REST handlers.
///
/// Everything hangs off one `EntityStore` plus the blob store; the service
/// values are thin clones over the same `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub blobs: Arc<BlobStore>,
    pub visibility: VisibilityService,
    pub investigations: InvestigationService,
    pub observations: ObservationService,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, blobs: Arc<BlobStore>) -> Self {
        Self {
            visibility: VisibilityService::new(store.clone()),
            investigations: InvestigationService::new(store.clone()),
            observations: ObservationService::new(store.clone()),
            store,
            blobs,
        }
    }
}

/// An HTTP-mapped error: status code plus the uniform JSON error body.
///
/// Everything a handler can fail with converts into this at the route
/// boundary; nothing propagates further, and 500s never leak internals.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{} not found", what))
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => Self::bad_request(msg),
            CoreError::Unauthenticated(msg) => Self::unauthenticated(msg),
            CoreError::Forbidden(msg) => Self::forbidden(msg),
            CoreError::NotFound(what) => Self::not_found(what),
            CoreError::Store(err) => {
                tracing::error!("store failure: {:?}", err);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl From<FilesError> for ApiError {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::BlobNotFound(_) => Self::not_found("file content"),
            FilesError::InvalidHash(msg) => Self::bad_request(msg),
            other => {
                tracing::error!("blob store failure: {:?}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Result alias for route handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// OpenAPI documentation for the service.
///
/// Coverage is deliberately partial: the monitored and auth paths carry full
/// schemas, the rest of the surface is self-describing JSON.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::auth::login),
    components(schemas(
        api_shared::HealthRes,
        api_shared::LoginReq,
        api_shared::LoginRes,
        api_shared::UserDto,
        api_shared::ErrorBody,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/login", post(handlers::auth::login))
        // sessions, groups, membership
        .route(
            "/api/sessions",
            get(handlers::sessions::list).post(handlers::sessions::create),
        )
        .route(
            "/api/sessions/:session_id",
            get(handlers::sessions::get_one)
                .patch(handlers::sessions::update)
                .delete(handlers::sessions::remove),
        )
        .route(
            "/api/sessions/:session_id/groups",
            get(handlers::sessions::list_groups).post(handlers::sessions::create_group),
        )
        .route(
            "/api/groups/:group_id/members",
            get(handlers::sessions::list_members).post(handlers::sessions::add_member),
        )
        .route(
            "/api/groups/:group_id/members/:user_id",
            delete(handlers::sessions::remove_member),
        )
        // patients and chart sub-resources
        .route(
            "/api/patients",
            get(handlers::patients::list).post(handlers::patients::create),
        )
        .route(
            "/api/patients/:patient_id",
            get(handlers::patients::get_one)
                .patch(handlers::patients::update)
                .delete(handlers::patients::remove),
        )
        .route(
            "/api/patients/:patient_id/vitals",
            get(handlers::clinical::list_vitals).post(handlers::clinical::create_vitals),
        )
        .route(
            "/api/patients/:patient_id/labs",
            get(handlers::clinical::list_labs).post(handlers::clinical::create_lab),
        )
        .route(
            "/api/patients/:patient_id/history",
            get(handlers::clinical::list_history).post(handlers::clinical::create_history),
        )
        .route(
            "/api/patients/:patient_id/medications",
            get(handlers::clinical::list_medications)
                .post(handlers::clinical::create_medication),
        )
        .route(
            "/api/patients/:patient_id/soap-notes",
            get(handlers::clinical::list_soap_notes)
                .post(handlers::clinical::create_soap_note),
        )
        .route(
            "/api/patients/:patient_id/orders",
            get(handlers::clinical::list_orders).post(handlers::clinical::create_order),
        )
        // observation bundles
        .route(
            "/api/patients/:patient_id/observations",
            get(handlers::observations::list).post(handlers::observations::create_bundle),
        )
        // patient files
        .route(
            "/api/patients/:patient_id/files",
            get(handlers::files::list).post(handlers::files::create),
        )
        .route("/api/files/:file_id/view", get(handlers::files::view))
        // investigation requests
        .route(
            "/api/patients/:patient_id/blood-test-requests",
            get(handlers::investigations::list_blood_tests)
                .post(handlers::investigations::create_blood_test),
        )
        .route(
            "/api/blood-test-requests/:request_id",
            axum::routing::patch(handlers::investigations::update_blood_test)
                .delete(handlers::investigations::delete_blood_test),
        )
        .route(
            "/api/patients/:patient_id/imaging-requests",
            get(handlers::investigations::list_imaging)
                .post(handlers::investigations::create_imaging),
        )
        .route(
            "/api/imaging-requests/:request_id",
            axum::routing::patch(handlers::investigations::update_imaging)
                .delete(handlers::investigations::delete_imaging),
        )
        // assets and visibility
        .route(
            "/api/sessions/:session_id/assets",
            get(handlers::assets::list_for_session).post(handlers::assets::upload),
        )
        .route(
            "/api/groups/:group_id/assets",
            get(handlers::assets::visible_for_group),
        )
        .route(
            "/api/assets/:asset_id/visibility/:group_id",
            get(handlers::assets::get_visibility).put(handlers::assets::put_visibility),
        )
        .route(
            "/api/assets/bulk-visibility/:group_id",
            put(handlers::assets::bulk_visibility),
        )
        // group-facing reads
        .route(
            "/api/groups/:group_id/documents",
            get(handlers::coordinator::released_for_group),
        )
        .route(
            "/api/groups/:group_id/assignments",
            get(handlers::admin::assignments_for_group),
        )
        // admin namespace
        .route(
            "/api/admin/users",
            get(handlers::admin::list_users).post(handlers::admin::create_user),
        )
        .route(
            "/api/admin/users/:user_id",
            axum::routing::patch(handlers::admin::update_user)
                .delete(handlers::admin::delete_user),
        )
        .route(
            "/api/admin/data-versions",
            get(handlers::admin::list_data_versions)
                .post(handlers::admin::create_data_version),
        )
        .route(
            "/api/admin/data-versions/:version_id",
            delete(handlers::admin::delete_data_version),
        )
        .route(
            "/api/admin/group-assignments",
            post(handlers::admin::create_assignment),
        )
        .route(
            "/api/admin/group-assignments/:assignment_id",
            delete(handlers::admin::delete_assignment),
        )
        .route(
            "/api/admin/group-accounts",
            get(handlers::admin::list_group_accounts)
                .post(handlers::admin::create_group_account),
        )
        .route("/api/admin/audit-logs", get(handlers::admin::list_audit_logs))
        // coordinator namespace
        .route(
            "/api/coordinator/documents",
            get(handlers::coordinator::list_documents)
                .post(handlers::coordinator::create_document),
        )
        .route(
            "/api/coordinator/documents/:document_id",
            get(handlers::coordinator::get_document)
                .patch(handlers::coordinator::update_document)
                .delete(handlers::coordinator::delete_document),
        )
        .route(
            "/api/coordinator/document-releases",
            get(handlers::coordinator::list_releases)
                .post(handlers::coordinator::create_release),
        )
        .route(
            "/api/coordinator/document-releases/:release_id/release",
            post(handlers::coordinator::perform_release),
        )
        .route(
            "/api/coordinator/document-releases/:release_id/cancel",
            post(handlers::coordinator::cancel_release),
        )
        .route(
            "/api/coordinator/simulation-weeks",
            get(handlers::coordinator::list_weeks).post(handlers::coordinator::create_week),
        )
        .route(
            "/api/coordinator/simulation-weeks/:week_id",
            axum::routing::patch(handlers::coordinator::update_week)
                .delete(handlers::coordinator::delete_week),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests;
