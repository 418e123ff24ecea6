//! Coordinator namespace: documents, releases, and simulation weeks.

use super::store_err;
use crate::context::{require_role, ActingUser, Scope};
use crate::{ApiError, ApiResult, AppState};
use api_shared::{paginate, PageParams, Paginated};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use simward_core::model::{
    Document, DocumentRelease, DocumentReleaseUpdate, DocumentUpdate, NewAuditLogEntry,
    NewDocument, NewDocumentRelease, NewSimulationWeek, ReleaseStatus, Role, SimulationWeek,
    SimulationWeekUpdate,
};
use simward_uuid::RecordId;

const COORDINATOR_ROLES: &[Role] = &[Role::Coordinator, Role::Admin];

// -- documents ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateDocumentBody {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub session_id: RecordId,
    #[serde(default)]
    pub patient_id: Option<RecordId>,
    #[serde(default)]
    pub content_base64: Option<String>,
}

pub async fn list_documents(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Paginated<Document>>> {
    require_role(&actor, COORDINATOR_ROLES)?;
    let documents = state.store.list_documents().map_err(store_err)?;
    Ok(Json(paginate("/api/coordinator/documents", page, documents)))
}

pub async fn create_document(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(body): Json<CreateDocumentBody>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    require_role(&actor, COORDINATOR_ROLES)?;
    state
        .store
        .get_session(body.session_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("session"))?;
    if let Some(patient_id) = body.patient_id {
        state
            .store
            .get_patient(patient_id)
            .map_err(store_err)?
            .ok_or_else(|| ApiError::not_found("patient"))?;
    }

    let content_hash = match body.content_base64 {
        Some(encoded) => {
            use base64::Engine;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&encoded)
                .map_err(|_| ApiError::bad_request("content_base64 is not valid base64"))?;
            Some(state.blobs.put(&body.title, &bytes)?.hash.to_string())
        }
        None => None,
    };

    let document = state
        .store
        .create_document(NewDocument {
            title: body.title,
            description: body.description,
            session_id: body.session_id,
            patient_id: body.patient_id,
            content_hash,
            uploaded_by: actor.id,
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get_document(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(document_id): Path<RecordId>,
) -> ApiResult<Json<Document>> {
    require_role(&actor, COORDINATOR_ROLES)?;
    let document = state
        .store
        .get_document(document_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("document"))?;
    Ok(Json(document))
}

pub async fn update_document(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(document_id): Path<RecordId>,
    Json(update): Json<DocumentUpdate>,
) -> ApiResult<Json<Document>> {
    require_role(&actor, COORDINATOR_ROLES)?;
    let document = state
        .store
        .update_document(document_id, update)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("document"))?;
    Ok(Json(document))
}

pub async fn delete_document(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(document_id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    require_role(&actor, COORDINATOR_ROLES)?;
    state.store.delete_document(document_id).map_err(store_err)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- releases ----------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateReleaseBody {
    pub document_id: RecordId,
    pub group_id: RecordId,
    /// When set, the release stays pending until performed; when unset the
    /// release is performed immediately.
    #[serde(default)]
    pub scheduled_at: Option<chrono::DateTime<Utc>>,
}

pub async fn list_releases(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
) -> ApiResult<Json<Vec<DocumentRelease>>> {
    require_role(&actor, COORDINATOR_ROLES)?;
    let releases = state.store.list_document_releases().map_err(store_err)?;
    Ok(Json(releases))
}

/// Creates a release. Without a schedule the document is delivered
/// immediately; with one it stays `pending` until performed or cancelled.
pub async fn create_release(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(body): Json<CreateReleaseBody>,
) -> ApiResult<(StatusCode, Json<DocumentRelease>)> {
    require_role(&actor, COORDINATOR_ROLES)?;
    state
        .store
        .get_document(body.document_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("document"))?;
    state
        .store
        .get_group(body.group_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("group"))?;

    let immediate = body.scheduled_at.is_none();
    let mut release = state
        .store
        .create_document_release(NewDocumentRelease {
            document_id: body.document_id,
            group_id: body.group_id,
            scheduled_at: body.scheduled_at,
            created_by: actor.id,
        })
        .map_err(store_err)?;

    if immediate {
        release = perform(&state, release.id, actor.id)?;
    }

    Ok((StatusCode::CREATED, Json(release)))
}

/// Marks a pending release as released.
pub async fn perform_release(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(release_id): Path<RecordId>,
) -> ApiResult<Json<DocumentRelease>> {
    require_role(&actor, COORDINATOR_ROLES)?;
    let release = perform(&state, release_id, actor.id)?;
    Ok(Json(release))
}

/// Marks a pending release as cancelled.
pub async fn cancel_release(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(release_id): Path<RecordId>,
) -> ApiResult<Json<DocumentRelease>> {
    require_role(&actor, COORDINATOR_ROLES)?;
    let release = state
        .store
        .get_document_release(release_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("release"))?;
    if release.status != ReleaseStatus::Pending {
        return Err(ApiError::bad_request("only pending releases can be cancelled"));
    }

    let cancelled = state
        .store
        .update_document_release(
            release_id,
            DocumentReleaseUpdate {
                status: Some(ReleaseStatus::Cancelled),
                released_at: None,
            },
        )
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("release"))?;

    state
        .store
        .append_audit(NewAuditLogEntry {
            actor_id: Some(actor.id),
            action: "document.release.cancel".into(),
            entity: "document_release".into(),
            entity_id: Some(release_id.to_string()),
        })
        .map_err(store_err)?;
    Ok(Json(cancelled))
}

fn perform(
    state: &AppState,
    release_id: RecordId,
    actor_id: RecordId,
) -> Result<DocumentRelease, ApiError> {
    let release = state
        .store
        .get_document_release(release_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("release"))?;
    if release.status != ReleaseStatus::Pending {
        return Err(ApiError::bad_request("only pending releases can be released"));
    }

    let released = state
        .store
        .update_document_release(
            release_id,
            DocumentReleaseUpdate {
                status: Some(ReleaseStatus::Released),
                released_at: Some(Utc::now()),
            },
        )
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("release"))?;

    state
        .store
        .append_audit(NewAuditLogEntry {
            actor_id: Some(actor_id),
            action: "document.release.perform".into(),
            entity: "document_release".into(),
            entity_id: Some(release_id.to_string()),
        })
        .map_err(store_err)?;

    Ok(released)
}

/// Documents with a performed release for the group. Members and staff only.
pub async fn released_for_group(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(group_id): Path<RecordId>,
) -> ApiResult<Json<Vec<Document>>> {
    if !scope.user.role.is_staff() && !scope.memberships.contains(&group_id) {
        return Err(ApiError::forbidden(
            "user is not a member of the requested group",
        ));
    }
    let documents = state.visibility.released_documents_for_group(group_id)?;
    Ok(Json(documents))
}

// -- simulation weeks --------------------------------------------------------

pub async fn list_weeks(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
) -> ApiResult<Json<Vec<SimulationWeek>>> {
    require_role(&actor, COORDINATOR_ROLES)?;
    let weeks = state.store.list_simulation_weeks().map_err(store_err)?;
    Ok(Json(weeks))
}

pub async fn create_week(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(new): Json<NewSimulationWeek>,
) -> ApiResult<(StatusCode, Json<SimulationWeek>)> {
    require_role(&actor, COORDINATOR_ROLES)?;
    if new.ends_on < new.starts_on {
        return Err(ApiError::bad_request("week ends before it starts"));
    }
    let week = state.store.create_simulation_week(new).map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(week)))
}

pub async fn update_week(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(week_id): Path<RecordId>,
    Json(update): Json<SimulationWeekUpdate>,
) -> ApiResult<Json<SimulationWeek>> {
    require_role(&actor, COORDINATOR_ROLES)?;
    let week = state
        .store
        .update_simulation_week(week_id, update)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("simulation week"))?;
    Ok(Json(week))
}

pub async fn delete_week(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(week_id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    require_role(&actor, COORDINATOR_ROLES)?;
    state
        .store
        .delete_simulation_week(week_id)
        .map_err(store_err)?;
    Ok(StatusCode::NO_CONTENT)
}
