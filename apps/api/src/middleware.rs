use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use qryvanta_core::{AppError, TenantId, UserIdentity};

use crate::error::ApiResult;

pub const SUBJECT_HEADER: &str = "x-qryvanta-subject";
pub const TENANT_HEADER: &str = "x-qryvanta-tenant-id";
pub const DISPLAY_NAME_HEADER: &str = "x-qryvanta-display-name";

/// Resolves the identity forwarded by the upstream gateway.
pub async fn require_identity(mut request: Request, next: Next) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers())?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn identity_from_headers(headers: &HeaderMap) -> Result<UserIdentity, AppError> {
    let subject = header_value(headers, SUBJECT_HEADER)
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let tenant_id = header_value(headers, TENANT_HEADER)
        .ok_or_else(|| AppError::Unauthorized("tenant header is required".to_owned()))?
        .parse::<TenantId>()
        .map_err(|_| AppError::Unauthorized("tenant header is not a valid id".to_owned()))?;

    UserIdentity::new(
        subject,
        header_value(headers, DISPLAY_NAME_HEADER),
        tenant_id,
    )
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};
    use qryvanta_core::{AppError, TenantId};

    use super::{SUBJECT_HEADER, TENANT_HEADER, identity_from_headers};

    #[test]
    fn headers_build_identity() {
        let tenant_id = TenantId::new();
        let mut headers = HeaderMap::new();
        headers.insert(SUBJECT_HEADER, HeaderValue::from_static("alice"));
        let Ok(tenant_value) = HeaderValue::from_str(tenant_id.to_string().as_str()) else {
            panic!("tenant header should encode");
        };
        headers.insert(TENANT_HEADER, tenant_value);

        let identity = identity_from_headers(&headers);
        assert_eq!(
            identity.map(|value| (value.subject().to_owned(), value.tenant_id())).ok(),
            Some(("alice".to_owned(), tenant_id))
        );
    }

    #[test]
    fn missing_subject_is_unauthorized() {
        let result = identity_from_headers(&HeaderMap::new());
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn malformed_tenant_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(SUBJECT_HEADER, HeaderValue::from_static("alice"));
        headers.insert(TENANT_HEADER, HeaderValue::from_static("not-a-uuid"));

        let result = identity_from_headers(&headers);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
