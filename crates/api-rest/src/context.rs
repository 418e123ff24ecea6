//! Request context extractors.
//!
//! Group scope is an explicit value resolved once per request and handed to
//! handlers as a parameter; nothing is stashed on ambient request state.
//!
//! - The acting user comes from the `x-user-id` header (401 when missing,
//!   malformed, or unknown).
//! - The active group comes from the `x-group-id` header, then the `group`
//!   query parameter, and otherwise defaults to the user's first membership
//!   (403 when the user is not a member of the requested group).

use crate::{ApiError, AppState};
use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;
use simward_core::model::{Role, User};
use simward_core::{resolve_group_scope, GroupScope};
use simward_uuid::RecordId;

const USER_HEADER: &str = "x-user-id";
const GROUP_HEADER: &str = "x-group-id";

/// The authenticated account behind the request.
#[derive(Debug, Clone)]
pub struct ActingUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for ActingUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header_id(parts, USER_HEADER)?
            .ok_or_else(|| ApiError::unauthenticated("missing user id"))?;

        let user = state
            .store
            .get_user(user_id)
            .map_err(simward_core::CoreError::from)
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::unauthenticated("unknown user"))?;

        Ok(ActingUser(user))
    }
}

#[derive(Debug, Deserialize)]
struct GroupQuery {
    group: Option<RecordId>,
}

/// Fully resolved group scope for the request.
#[derive(Debug, Clone)]
pub struct Scope(pub GroupScope);

#[async_trait]
impl FromRequestParts<AppState> for Scope {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header_id(parts, USER_HEADER)?
            .ok_or_else(|| ApiError::unauthenticated("missing user id"))?;

        let requested_group = match header_text(parts, GROUP_HEADER) {
            Some(text) => Some(
                RecordId::parse(text)
                    .map_err(|_| ApiError::bad_request("malformed x-group-id header"))?,
            ),
            None => Query::<GroupQuery>::try_from_uri(&parts.uri)
                .map_err(|_| ApiError::bad_request("malformed group parameter"))?
                .0
                .group,
        };

        let scope = resolve_group_scope(state.store.as_ref(), user_id, requested_group)?;
        Ok(Scope(scope))
    }
}

fn header_text<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_id(parts: &Parts, name: &str) -> Result<Option<RecordId>, ApiError> {
    let Some(text) = header_text(parts, name) else {
        return Ok(None);
    };
    RecordId::parse(text)
        .map(Some)
        .map_err(|_| ApiError::unauthenticated(format!("malformed {} header", name)))
}

/// Rejects non-staff accounts.
pub fn require_staff(user: &User) -> Result<(), ApiError> {
    if user.role.is_staff() {
        Ok(())
    } else {
        Err(ApiError::forbidden("staff role required"))
    }
}

/// Rejects accounts whose role is not in `roles`.
pub fn require_role(user: &User, roles: &[Role]) -> Result<(), ApiError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden("insufficient role"))
    }
}
