//! Investigation request endpoints.
//!
//! Groups raise requests against their assigned patients; staff complete
//! them, attaching the file grants that the file-view path honours.

use crate::context::{require_staff, ActingUser, Scope};
use crate::{ApiError, ApiResult, AppState};
use api_shared::{paginate, PageParams, Paginated};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use simward_core::investigations::{
    CompleteRequestInput, CreateBloodTestInput, CreateImagingInput,
};
use simward_core::model::{ApprovedFile, BloodTestRequest, ImagingRequest, RequestStatus};
use simward_core::ListOrdering;
use simward_uuid::RecordId;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListParams {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Status update body. The only accepted transition is to `completed`.
#[derive(Debug, Deserialize)]
pub struct UpdateRequestBody {
    pub status: RequestStatus,
    #[serde(default)]
    pub approved_files: Vec<ApprovedFile>,
    #[serde(default)]
    pub signed_off_name: Option<String>,
    #[serde(default)]
    pub signed_off_role: Option<String>,
}

impl UpdateRequestBody {
    fn into_completion(self) -> Result<CompleteRequestInput, ApiError> {
        if self.status != RequestStatus::Completed {
            return Err(ApiError::bad_request(
                "the only supported status transition is to 'completed'",
            ));
        }
        Ok(CompleteRequestInput {
            approved_files: self.approved_files,
            signed_off_name: self.signed_off_name,
            signed_off_role: self.signed_off_role,
        })
    }
}

// -- blood tests -------------------------------------------------------------

pub async fn list_blood_tests(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Paginated<BloodTestRequest>>> {
    state.visibility.ensure_patient_access(&scope, patient_id)?;
    let ordering = ListOrdering::parse(params.ordering.as_deref())?;
    let requests = state
        .investigations
        .list_blood_tests(Some(patient_id), ordering)?;
    let path = format!("/api/patients/{}/blood-test-requests", patient_id);
    Ok(Json(paginate(&path, params.page_params(), requests)))
}

pub async fn create_blood_test(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Json(input): Json<CreateBloodTestInput>,
) -> ApiResult<(StatusCode, Json<BloodTestRequest>)> {
    state.visibility.ensure_patient_access(&scope, patient_id)?;
    let request = state
        .investigations
        .create_blood_test(patient_id, &scope, input)?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn update_blood_test(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(request_id): Path<RecordId>,
    Json(body): Json<UpdateRequestBody>,
) -> ApiResult<Json<BloodTestRequest>> {
    require_staff(&user)?;
    let input = body.into_completion()?;
    let request = state.investigations.complete_blood_test(request_id, input)?;
    Ok(Json(request))
}

pub async fn delete_blood_test(
    State(state): State<AppState>,
    ActingUser(_user): ActingUser,
    Path(request_id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    state.investigations.delete_blood_test(request_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- imaging -----------------------------------------------------------------

pub async fn list_imaging(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Paginated<ImagingRequest>>> {
    state.visibility.ensure_patient_access(&scope, patient_id)?;
    let ordering = ListOrdering::parse(params.ordering.as_deref())?;
    let requests = state
        .investigations
        .list_imaging(Some(patient_id), ordering)?;
    let path = format!("/api/patients/{}/imaging-requests", patient_id);
    Ok(Json(paginate(&path, params.page_params(), requests)))
}

pub async fn create_imaging(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Json(input): Json<CreateImagingInput>,
) -> ApiResult<(StatusCode, Json<ImagingRequest>)> {
    state.visibility.ensure_patient_access(&scope, patient_id)?;
    let request = state
        .investigations
        .create_imaging(patient_id, &scope, input)?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn update_imaging(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(request_id): Path<RecordId>,
    Json(body): Json<UpdateRequestBody>,
) -> ApiResult<Json<ImagingRequest>> {
    require_staff(&user)?;
    let input = body.into_completion()?;
    let request = state.investigations.complete_imaging(request_id, input)?;
    Ok(Json(request))
}

pub async fn delete_imaging(
    State(state): State<AppState>,
    ActingUser(_user): ActingUser,
    Path(request_id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    state.investigations.delete_imaging(request_id)?;
    Ok(StatusCode::NO_CONTENT)
}
