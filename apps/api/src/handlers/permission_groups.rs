use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use qryvanta_application::CreatePermissionGroupInput;
use qryvanta_core::{AppError, UserIdentity};
use uuid::Uuid;

use crate::dto::{
    CreatePermissionGroupRequest, GroupScopeQuery, PermissionGroupResponse,
    UpdatePermissionGroupRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

fn parse_group_id(value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::Validation(format!("'{value}' is not a valid group id")))
}

pub async fn list_permission_groups_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<GroupScopeQuery>,
) -> ApiResult<Json<Vec<PermissionGroupResponse>>> {
    let groups = state
        .permission_group_service
        .list_groups(&user, query.selector()?)
        .await?
        .into_iter()
        .map(PermissionGroupResponse::from)
        .collect();

    Ok(Json(groups))
}

pub async fn get_permission_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
) -> ApiResult<Json<PermissionGroupResponse>> {
    let group = state
        .permission_group_service
        .get_group(&user, parse_group_id(group_id.as_str())?)
        .await?;

    Ok(Json(PermissionGroupResponse::from(group)))
}

pub async fn create_permission_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreatePermissionGroupRequest>,
) -> ApiResult<(StatusCode, Json<PermissionGroupResponse>)> {
    let group = state
        .permission_group_service
        .create_group(&user, CreatePermissionGroupInput::try_from(payload)?)
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionGroupResponse::from(group))))
}

pub async fn update_permission_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
    Json(payload): Json<UpdatePermissionGroupRequest>,
) -> ApiResult<Json<PermissionGroupResponse>> {
    let group = state
        .permission_group_service
        .update_group(&user, parse_group_id(group_id.as_str())?, payload.into())
        .await?;

    Ok(Json(PermissionGroupResponse::from(group)))
}

pub async fn set_default_permission_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
) -> ApiResult<Json<PermissionGroupResponse>> {
    let group = state
        .permission_group_service
        .set_default_group(&user, parse_group_id(group_id.as_str())?)
        .await?;

    Ok(Json(PermissionGroupResponse::from(group)))
}

pub async fn delete_permission_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .permission_group_service
        .delete_group(&user, parse_group_id(group_id.as_str())?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
