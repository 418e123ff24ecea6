//! Patient CRUD.
//!
//! Reads are group-scoped: students only see patients their active group has
//! an assignment for, while staff see everything. Writes are staff-only.

use super::store_err;
use crate::context::{require_staff, ActingUser, Scope};
use crate::{ApiError, ApiResult, AppState};
use api_shared::{paginate, PageParams, Paginated};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use simward_core::model::{NewPatient, Patient, PatientUpdate};
use simward_uuid::RecordId;

/// Lists patients visible to the acting scope, paginated.
pub async fn list(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Paginated<Patient>>> {
    let all = state.store.list_patients().map_err(store_err)?;

    let visible = if scope.user.role.is_staff() {
        all
    } else {
        let group_id = scope.require_group()?;
        let assigned: Vec<RecordId> = state
            .store
            .assignments_for_group(group_id)
            .map_err(store_err)?
            .into_iter()
            .map(|a| a.patient_id)
            .collect();
        all.into_iter()
            .filter(|p| assigned.contains(&p.id))
            .collect()
    };

    Ok(Json(paginate("/api/patients", page, visible)))
}

pub async fn create(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Json(new): Json<NewPatient>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    require_staff(&user)?;
    let patient = state.store.create_patient(new).map_err(store_err)?;
    tracing::info!(patient = %patient.id, "patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn get_one(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
) -> ApiResult<Json<Patient>> {
    let patient = state
        .store
        .get_patient(patient_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("patient"))?;
    state.visibility.ensure_patient_access(&scope, patient_id)?;
    Ok(Json(patient))
}

pub async fn update(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(patient_id): Path<RecordId>,
    Json(update): Json<PatientUpdate>,
) -> ApiResult<Json<Patient>> {
    require_staff(&user)?;
    let patient = state
        .store
        .update_patient(patient_id, update)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("patient"))?;
    Ok(Json(patient))
}

/// Deletes a patient with the full dependent-record cascade.
pub async fn remove(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(patient_id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    require_staff(&user)?;
    if state.store.delete_patient(patient_id).map_err(store_err)? {
        tracing::info!(patient = %patient_id, "patient deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("patient"))
    }
}
