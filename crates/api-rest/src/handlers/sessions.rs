//! Session, group, and membership endpoints.

use super::store_err;
use crate::context::{require_staff, ActingUser};
use crate::{ApiError, ApiResult, AppState};
use api_shared::{paginate, PageParams, Paginated};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use simward_core::model::{
    Group, GroupMember, NewGroup, NewSession, Session, SessionUpdate,
};
use simward_uuid::RecordId;

#[derive(Debug, Deserialize)]
pub struct CreateSessionBody {
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub time_remaining_secs: i64,
}

/// Lists all sessions, paginated.
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Paginated<Session>>> {
    let sessions = state.store.list_sessions().map_err(store_err)?;
    Ok(Json(paginate("/api/sessions", page, sessions)))
}

/// Creates a session owned by the acting instructor.
pub async fn create(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Json(body): Json<CreateSessionBody>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    require_staff(&user)?;
    let session = state
        .store
        .create_session(NewSession {
            name: body.name,
            instructor_id: user.id,
            active: body.active,
            time_remaining_secs: body.time_remaining_secs,
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(session_id): Path<RecordId>,
) -> ApiResult<Json<Session>> {
    let session = state
        .store
        .get_session(session_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("session"))?;
    Ok(Json(session))
}

pub async fn update(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(session_id): Path<RecordId>,
    Json(update): Json<SessionUpdate>,
) -> ApiResult<Json<Session>> {
    require_staff(&user)?;
    let session = state
        .store
        .update_session(session_id, update)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("session"))?;
    Ok(Json(session))
}

pub async fn remove(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(session_id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    require_staff(&user)?;
    state.store.delete_session(session_id).map_err(store_err)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupBody {
    pub name: String,
}

/// Groups belonging to a session.
pub async fn list_groups(
    State(state): State<AppState>,
    Path(session_id): Path<RecordId>,
) -> ApiResult<Json<Vec<Group>>> {
    state
        .store
        .get_session(session_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("session"))?;
    let groups = state.store.groups_by_session(session_id).map_err(store_err)?;
    Ok(Json(groups))
}

pub async fn create_group(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(session_id): Path<RecordId>,
    Json(body): Json<CreateGroupBody>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    require_staff(&user)?;
    state
        .store
        .get_session(session_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("session"))?;
    let group = state
        .store
        .create_group(NewGroup {
            name: body.name,
            session_id,
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[derive(Debug, Deserialize)]
pub struct AddMemberBody {
    pub user_id: RecordId,
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(group_id): Path<RecordId>,
) -> ApiResult<Json<Vec<GroupMember>>> {
    state
        .store
        .get_group(group_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("group"))?;
    let members = state.store.members_of_group(group_id).map_err(store_err)?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(group_id): Path<RecordId>,
    Json(body): Json<AddMemberBody>,
) -> ApiResult<(StatusCode, Json<GroupMember>)> {
    require_staff(&user)?;
    state
        .store
        .get_group(group_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("group"))?;
    state
        .store
        .get_user(body.user_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("user"))?;
    let member = state
        .store
        .add_group_member(group_id, body.user_id)
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((group_id, user_id)): Path<(RecordId, RecordId)>,
) -> ApiResult<StatusCode> {
    require_staff(&user)?;
    state
        .store
        .remove_group_member(group_id, user_id)
        .map_err(store_err)?;
    Ok(StatusCode::NO_CONTENT)
}
