//! Observation bundle endpoints.

use crate::context::Scope;
use crate::{ApiResult, AppState};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use simward_core::observations::{ObservationBundle, ObservationSet};
use simward_core::ListOrdering;
use simward_uuid::RecordId;

#[derive(Debug, Default, Deserialize)]
pub struct OrderingParams {
    pub ordering: Option<String>,
}

/// Writes the populated sub-records of a sparse vital-sign bundle.
///
/// Each present key becomes exactly one sub-record with a server-assigned
/// timestamp; the response carries just the records this call created.
pub async fn create_bundle(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Json(bundle): Json<ObservationBundle>,
) -> ApiResult<(StatusCode, Json<ObservationSet>)> {
    state.visibility.ensure_patient_access(&scope, patient_id)?;
    let created = state
        .observations
        .create_bundle(patient_id, scope.user.id, bundle)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Lists all observations for a patient, one array per vital-sign type.
///
/// `?ordering=-created_at` puts the latest reading at the head of each array.
pub async fn list(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Query(params): Query<OrderingParams>,
) -> ApiResult<Json<ObservationSet>> {
    state.visibility.ensure_patient_access(&scope, patient_id)?;
    let ordering = ListOrdering::parse(params.ordering.as_deref())?;
    let set = state.observations.list(patient_id, ordering)?;
    Ok(Json(set))
}
