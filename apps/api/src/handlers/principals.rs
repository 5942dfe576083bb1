use axum::Json;
use axum::extract::{Extension, Path, State};

use qryvanta_core::UserIdentity;
use qryvanta_domain::PrincipalPermissionAssignment;

use crate::dto::{
    EffectivePermissionsResponse, PrincipalAssignmentResponse, SavePrincipalAssignmentRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_principal_assignment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(subject): Path<String>,
) -> ApiResult<Json<PrincipalAssignmentResponse>> {
    let assignment = state
        .assignment_service
        .get_assignment(&user, subject.as_str())
        .await?;

    Ok(Json(PrincipalAssignmentResponse::new(
        subject.as_str(),
        assignment,
    )))
}

pub async fn save_principal_assignment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(subject): Path<String>,
    Json(payload): Json<SavePrincipalAssignmentRequest>,
) -> ApiResult<Json<PrincipalAssignmentResponse>> {
    let assignment = state
        .assignment_service
        .save_assignment(
            &user,
            subject.as_str(),
            PrincipalPermissionAssignment::try_from(payload)?,
        )
        .await?;

    Ok(Json(PrincipalAssignmentResponse::new(
        subject.trim(),
        assignment,
    )))
}

pub async fn principal_effective_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(subject): Path<String>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let effective = state
        .assignment_service
        .get_effective_permissions(&user, subject.as_str())
        .await?;

    Ok(Json(EffectivePermissionsResponse::from(effective)))
}
