//! Session asset endpoints and the per-group visibility toggles.

use super::store_err;
use crate::context::{require_staff, ActingUser, Scope};
use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};
use simward_core::model::{Asset, AssetGroupVisibility, NewAsset};
use simward_uuid::RecordId;

#[derive(Debug, Deserialize)]
pub struct UploadAssetBody {
    pub filename: String,
    pub kind: String,
    /// Raw file bytes, base64 encoded.
    pub content_base64: String,
}

/// All assets of a session, regardless of visibility. Staff only.
pub async fn list_for_session(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(session_id): Path<RecordId>,
) -> ApiResult<Json<Vec<Asset>>> {
    require_staff(&user)?;
    state
        .store
        .get_session(session_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("session"))?;
    let assets = state
        .store
        .assets_by_session(session_id)
        .map_err(store_err)?;
    Ok(Json(assets))
}

/// Uploads an asset into a session. Newly uploaded assets are visible to no
/// group until a visibility row is written.
pub async fn upload(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(session_id): Path<RecordId>,
    Json(body): Json<UploadAssetBody>,
) -> ApiResult<(StatusCode, Json<Asset>)> {
    require_staff(&user)?;
    state
        .store
        .get_session(session_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("session"))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&body.content_base64)
        .map_err(|_| ApiError::bad_request("content_base64 is not valid base64"))?;
    let metadata = state.blobs.put(&body.filename, &bytes)?;

    let asset = state
        .store
        .create_asset(NewAsset {
            filename: body.filename,
            kind: body.kind,
            content_hash: metadata.hash.to_string(),
            session_id,
            uploaded_by: user.id,
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// Assets the group has been granted. Members of the group and staff only.
pub async fn visible_for_group(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(group_id): Path<RecordId>,
) -> ApiResult<Json<Vec<Asset>>> {
    if !scope.user.role.is_staff() && !scope.memberships.contains(&group_id) {
        return Err(ApiError::forbidden(
            "user is not a member of the requested group",
        ));
    }
    let assets = state.visibility.visible_assets_for_group(group_id)?;
    Ok(Json(assets))
}

/// Reads the visibility row for one (asset, group) pair. Absence of a row is
/// a 404, which on this resource means "not visible".
pub async fn get_visibility(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((asset_id, group_id)): Path<(RecordId, RecordId)>,
) -> ApiResult<Json<AssetGroupVisibility>> {
    require_staff(&user)?;
    let row = state
        .store
        .get_asset_visibility(asset_id, group_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("visibility row"))?;
    Ok(Json(row))
}

#[derive(Debug, Deserialize)]
pub struct PutVisibilityBody {
    pub visible: bool,
}

/// Upserts the visibility row for one (asset, group) pair. Last writer wins.
pub async fn put_visibility(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((asset_id, group_id)): Path<(RecordId, RecordId)>,
    Json(body): Json<PutVisibilityBody>,
) -> ApiResult<Json<AssetGroupVisibility>> {
    require_staff(&user)?;
    let row = state
        .visibility
        .update_asset_visibility(asset_id, group_id, body.visible, user.id)?;
    Ok(Json(row))
}

#[derive(Debug, Deserialize)]
pub struct BulkVisibilityBody {
    pub asset_ids: Vec<RecordId>,
    pub visible: bool,
}

#[derive(Debug, Serialize)]
pub struct BulkVisibilityRes {
    pub updated: Vec<AssetGroupVisibility>,
    pub skipped: Vec<RecordId>,
}

/// Applies the visibility upsert independently to each asset id.
///
/// Unknown ids are reported in `skipped`; writes that already happened are
/// not rolled back.
pub async fn bulk_visibility(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(group_id): Path<RecordId>,
    Json(body): Json<BulkVisibilityBody>,
) -> ApiResult<Json<BulkVisibilityRes>> {
    require_staff(&user)?;
    let outcome = state.visibility.bulk_update_asset_visibility(
        &body.asset_ids,
        group_id,
        body.visible,
        user.id,
    )?;
    Ok(Json(BulkVisibilityRes {
        updated: outcome.updated,
        skipped: outcome.skipped,
    }))
}
