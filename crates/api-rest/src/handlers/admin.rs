//! Admin namespace: accounts, data versions, assignments, audit logs.

use super::store_err;
use crate::context::{require_role, ActingUser, Scope};
use crate::{ApiError, ApiResult, AppState};
use api_shared::{paginate, PageParams, Paginated, UserDto};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use simward_core::model::{
    AuditLogEntry, DataVersion, GroupDataAssignment, NewAuditLogEntry, NewDataVersion,
    NewGroupDataAssignment, NewUser, Role, UserUpdate,
};
use simward_uuid::RecordId;

// -- users -------------------------------------------------------------------

pub async fn list_users(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Paginated<UserDto>>> {
    require_role(&actor, &[Role::Admin])?;
    let users: Vec<UserDto> = state
        .store
        .list_users()
        .map_err(store_err)?
        .into_iter()
        .map(UserDto::from)
        .collect();
    Ok(Json(paginate("/api/admin/users", page, users)))
}

pub async fn create_user(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(new): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<UserDto>)> {
    require_role(&actor, &[Role::Admin])?;
    if state
        .store
        .get_user_by_username(&new.username)
        .map_err(store_err)?
        .is_some()
    {
        return Err(ApiError::bad_request("username is already taken"));
    }
    let user = state.store.create_user(new).map_err(store_err)?;
    state
        .store
        .append_audit(NewAuditLogEntry {
            actor_id: Some(actor.id),
            action: "user.create".into(),
            entity: "user".into(),
            entity_id: Some(user.id.to_string()),
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

pub async fn update_user(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(user_id): Path<RecordId>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Json<UserDto>> {
    require_role(&actor, &[Role::Admin])?;
    let user = state
        .store
        .update_user(user_id, update)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("user"))?;
    Ok(Json(UserDto::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(user_id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    require_role(&actor, &[Role::Admin])?;
    state.store.delete_user(user_id).map_err(store_err)?;
    state
        .store
        .append_audit(NewAuditLogEntry {
            actor_id: Some(actor.id),
            action: "user.delete".into(),
            entity: "user".into(),
            entity_id: Some(user_id.to_string()),
        })
        .map_err(store_err)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- data versions -----------------------------------------------------------

pub async fn list_data_versions(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
) -> ApiResult<Json<Vec<DataVersion>>> {
    require_role(&actor, &[Role::Admin])?;
    let versions = state.store.list_data_versions().map_err(store_err)?;
    Ok(Json(versions))
}

pub async fn create_data_version(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(new): Json<NewDataVersion>,
) -> ApiResult<(StatusCode, Json<DataVersion>)> {
    require_role(&actor, &[Role::Admin])?;
    let version = state.store.create_data_version(new).map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(version)))
}

pub async fn delete_data_version(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(version_id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    require_role(&actor, &[Role::Admin])?;
    state
        .store
        .delete_data_version(version_id)
        .map_err(store_err)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- group data assignments --------------------------------------------------

pub async fn create_assignment(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(new): Json<NewGroupDataAssignment>,
) -> ApiResult<(StatusCode, Json<GroupDataAssignment>)> {
    require_role(&actor, &[Role::Admin])?;
    state
        .store
        .get_group(new.group_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("group"))?;
    state
        .store
        .get_patient(new.patient_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("patient"))?;
    state
        .store
        .get_data_version(new.data_version_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("data version"))?;
    let assignment = state
        .store
        .create_group_data_assignment(new)
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn delete_assignment(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(assignment_id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    require_role(&actor, &[Role::Admin])?;
    state
        .store
        .delete_group_data_assignment(assignment_id)
        .map_err(store_err)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assignments of one group. Members of the group and staff only.
pub async fn assignments_for_group(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(group_id): Path<RecordId>,
) -> ApiResult<Json<Vec<GroupDataAssignment>>> {
    if !scope.user.role.is_staff() && !scope.memberships.contains(&group_id) {
        return Err(ApiError::forbidden(
            "user is not a member of the requested group",
        ));
    }
    let assignments = state.visibility.assignments_for_group(group_id)?;
    Ok(Json(assignments))
}

// -- group accounts ----------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateGroupAccountBody {
    pub group_id: RecordId,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupAccountRes {
    pub user: UserDto,
    pub group_id: RecordId,
}

/// Creates the shared student account for a group and enrols it in one call.
pub async fn create_group_account(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(body): Json<CreateGroupAccountBody>,
) -> ApiResult<(StatusCode, Json<GroupAccountRes>)> {
    require_role(&actor, &[Role::Admin])?;
    let group = state
        .store
        .get_group(body.group_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("group"))?;
    if state
        .store
        .get_user_by_username(&body.username)
        .map_err(store_err)?
        .is_some()
    {
        return Err(ApiError::bad_request("username is already taken"));
    }

    let user = state
        .store
        .create_user(NewUser {
            username: body.username,
            password: body.password,
            role: Role::Student,
            first_name: body.first_name.unwrap_or_else(|| group.name.clone()),
            last_name: body.last_name.unwrap_or_else(|| "account".into()),
        })
        .map_err(store_err)?;
    state
        .store
        .add_group_member(group.id, user.id)
        .map_err(store_err)?;
    state
        .store
        .append_audit(NewAuditLogEntry {
            actor_id: Some(actor.id),
            action: "group_account.create".into(),
            entity: "group".into(),
            entity_id: Some(group.id.to_string()),
        })
        .map_err(store_err)?;

    Ok((
        StatusCode::CREATED,
        Json(GroupAccountRes {
            user: UserDto::from(user),
            group_id: group.id,
        }),
    ))
}

/// Lists student accounts together with the groups they belong to.
pub async fn list_group_accounts(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
) -> ApiResult<Json<Vec<GroupAccountRes>>> {
    require_role(&actor, &[Role::Admin])?;
    let mut accounts = Vec::new();
    for user in state.store.list_users().map_err(store_err)? {
        if user.role != Role::Student {
            continue;
        }
        for group in state.store.groups_for_user(user.id).map_err(store_err)? {
            accounts.push(GroupAccountRes {
                user: UserDto::from(user.clone()),
                group_id: group.id,
            });
        }
    }
    Ok(Json(accounts))
}

// -- audit logs --------------------------------------------------------------

/// Paginated audit trail, newest entries first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Paginated<AuditLogEntry>>> {
    require_role(&actor, &[Role::Admin])?;
    let mut logs = state.store.list_audit_logs().map_err(store_err)?;
    logs.reverse();
    Ok(Json(paginate("/api/admin/audit-logs", page, logs)))
}
