use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use qryvanta_core::AppError;
use tracing::error;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        (status, Json(ErrorResponse::from_error(&self.0))).into_response()
    }
}

fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_)
        | AppError::DuplicateName(_)
        | AppError::ReferencedGroupDeletion { .. } => StatusCode::CONFLICT,
        AppError::InvalidPermissionIds(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::CatalogueNotReady => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::CatalogueLoad(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use qryvanta_core::AppError;

    use super::{ApiError, ErrorResponse};

    #[test]
    fn invalid_ids_map_to_unprocessable_entity() {
        let response =
            ApiError::from(AppError::InvalidPermissionIds(vec!["a.b".to_owned()])).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn referenced_group_deletion_lists_principals() {
        let payload = ErrorResponse::from_error(&AppError::ReferencedGroupDeletion {
            group_id: "g-1".to_owned(),
            principals: vec!["bob@t-1".to_owned()],
        });

        assert_eq!(payload.code, "referenced_group_deletion");
        assert_eq!(payload.referencing_principals, Some(vec!["bob@t-1".to_owned()]));
        assert_eq!(payload.invalid_ids, None);
    }

    #[test]
    fn catalogue_not_ready_is_service_unavailable() {
        let response = ApiError::from(AppError::CatalogueNotReady).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
