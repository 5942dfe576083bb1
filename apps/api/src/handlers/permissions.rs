use axum::Json;
use axum::extract::{Extension, Path, State};

use qryvanta_core::UserIdentity;

use crate::dto::{
    CatalogueReloadResponse, EffectivePermissionsResponse, PermissionNodeResponse,
    PermissionTreeNodeResponse, ValidatePermissionsRequest, ValidatePermissionsResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn permission_tree_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<PermissionTreeNodeResponse>>> {
    let tree = state
        .permission_admin_service
        .get_tree(&user)
        .await?
        .into_iter()
        .map(PermissionTreeNodeResponse::from)
        .collect();

    Ok(Json(tree))
}

pub async fn all_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.permission_admin_service.get_all(&user).await?))
}

pub async fn permission_node_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(permission_id): Path<String>,
) -> ApiResult<Json<PermissionNodeResponse>> {
    let node = state
        .permission_admin_service
        .get_node(&user, permission_id.as_str())
        .await?;

    Ok(Json(PermissionNodeResponse::from(node)))
}

pub async fn validate_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<ValidatePermissionsRequest>,
) -> ApiResult<Json<ValidatePermissionsResponse>> {
    let result = state
        .permission_admin_service
        .validate(&user, &payload.permissions)
        .await?;

    Ok(Json(ValidatePermissionsResponse::from(result)))
}

pub async fn own_effective_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let effective = state
        .permission_admin_service
        .effective_permissions(&user)
        .await?;

    Ok(Json(EffectivePermissionsResponse::from(effective)))
}

pub async fn reload_catalogue_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<CatalogueReloadResponse>> {
    let summary = state
        .permission_admin_service
        .reload_catalogue(&user)
        .await?;

    Ok(Json(CatalogueReloadResponse::from(summary)))
}
