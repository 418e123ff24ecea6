//! Patient file endpoints, including the gated raw view.

use super::store_err;
use crate::context::{require_staff, Scope};
use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use base64::Engine;
use serde::Deserialize;
use simward_core::model::{FileCategory, NewPatientFile, PatientFile};
use simward_files::Sha256Hex;
use simward_types::PageRange;
use simward_uuid::RecordId;

#[derive(Debug, Deserialize)]
pub struct UploadFileBody {
    pub display_name: String,
    pub category: FileCategory,
    #[serde(default)]
    pub requires_pagination: bool,
    /// Raw file bytes, base64 encoded.
    pub content_base64: String,
}

/// Lists a patient's files (metadata only; bytes go through the view path).
pub async fn list(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
) -> ApiResult<Json<Vec<PatientFile>>> {
    state
        .store
        .get_patient(patient_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("patient"))?;
    state.visibility.ensure_patient_access(&scope, patient_id)?;
    let files = state
        .store
        .files_by_patient(patient_id)
        .map_err(store_err)?;
    Ok(Json(files))
}

/// Uploads a patient file: bytes to the blob store, metadata to the entity
/// store. Staff only.
pub async fn create(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Json(body): Json<UploadFileBody>,
) -> ApiResult<(StatusCode, Json<PatientFile>)> {
    require_staff(&scope.user)?;
    state
        .store
        .get_patient(patient_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("patient"))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&body.content_base64)
        .map_err(|_| ApiError::bad_request("content_base64 is not valid base64"))?;

    let metadata = state.blobs.put(&body.display_name, &bytes)?;
    let file = state
        .store
        .create_patient_file(NewPatientFile {
            patient_id,
            display_name: body.display_name,
            category: body.category,
            requires_pagination: body.requires_pagination,
            content_hash: metadata.hash.to_string(),
            media_type: metadata.media_type.as_ref().map(|m| m.as_str().to_owned()),
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(file)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    pub page_range: Option<String>,
}

/// Serves a file's raw bytes with its content type.
///
/// Staff scopes read anything. Student scopes need a completed investigation
/// request of their active group whose `approved_files` name the file; when
/// the grant is range-limited, the requested `page_range` must lie within it.
pub async fn view(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(file_id): Path<RecordId>,
    Query(params): Query<ViewParams>,
) -> ApiResult<impl IntoResponse> {
    let file = state
        .store
        .get_patient_file(file_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("file"))?;

    let requested = params
        .page_range
        .as_deref()
        .map(PageRange::parse)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    if !scope.user.role.is_staff() {
        let group_id = scope.require_group()?;
        state
            .visibility
            .can_group_view_file(group_id, &file, requested.as_ref())?;
    }

    let hash = Sha256Hex::parse(&file.content_hash)?;
    let bytes = state.blobs.get(&hash)?;

    let content_type = file
        .media_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    Ok((headers, bytes))
}
