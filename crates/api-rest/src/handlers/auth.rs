//! Login endpoint.

use crate::{ApiResult, AppState};
use api_shared::{LoginReq, LoginRes, UserDto};
use axum::extract::State;
use axum::Json;
use simward_core::auth::authenticate;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Login successful", body = LoginRes),
        (status = 401, description = "Invalid credentials", body = api_shared::ErrorBody)
    )
)]
/// Verifies a username/password pair and returns the account.
///
/// Wrong password and unknown username both produce the same 401 body, so
/// the endpoint does not reveal which usernames exist.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> ApiResult<Json<LoginRes>> {
    let user = authenticate(state.store.as_ref(), &req.username, &req.password)?;
    tracing::info!(user = %user.id, "login");
    Ok(Json(LoginRes {
        user: UserDto::from(user),
    }))
}
