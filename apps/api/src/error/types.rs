use qryvanta_core::AppError;
use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referencing_principals: Option<Vec<String>>,
}

impl ErrorResponse {
    pub(super) fn from_error(error: &AppError) -> Self {
        let (invalid_ids, referencing_principals) = match error {
            AppError::InvalidPermissionIds(ids) => (Some(ids.clone()), None),
            AppError::ReferencedGroupDeletion { principals, .. } => {
                (None, Some(principals.clone()))
            }
            _ => (None, None),
        };

        Self {
            message: error.to_string(),
            code: error_code(error),
            invalid_ids,
            referencing_principals,
        }
    }
}

fn error_code(error: &AppError) -> &'static str {
    match error {
        AppError::Validation(_) => "validation",
        AppError::NotFound(_) => "not_found",
        AppError::Conflict(_) => "conflict",
        AppError::DuplicateName(_) => "duplicate_name",
        AppError::InvalidPermissionIds(_) => "invalid_permission_ids",
        AppError::ReferencedGroupDeletion { .. } => "referenced_group_deletion",
        AppError::CatalogueLoad(_) => "catalogue_load",
        AppError::CatalogueNotReady => "catalogue_not_ready",
        AppError::Unauthorized(_) => "unauthorized",
        AppError::Forbidden(_) => "forbidden",
        AppError::Internal(_) => "internal",
    }
}
