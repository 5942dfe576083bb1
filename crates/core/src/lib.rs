//! Shared primitives for all Rust crates in Qryvanta.

#![forbid(unsafe_code)]

/// Principal identity primitives shared across services.
pub mod identity;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use identity::UserIdentity;

/// Result type used across Qryvanta crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Tenant identifier used as the partition key for every persisted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid tenant id '{value}': {error}")))
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A name collides with another record in the same scope.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A write payload references permission ids unknown to the catalogue.
    #[error("invalid permission ids: {}", .0.join(", "))]
    InvalidPermissionIds(Vec<String>),

    /// A group cannot be deleted while principals still reference it.
    #[error(
        "permission group '{group_id}' is still assigned to: {}",
        .principals.join(", ")
    )]
    ReferencedGroupDeletion {
        /// Group that was requested for deletion.
        group_id: String,
        /// Principals that still reference the group.
        principals: Vec<String>,
    },

    /// The permission catalogue definition is malformed.
    #[error("permission catalogue load failed: {0}")]
    CatalogueLoad(String),

    /// The permission catalogue has not been loaded yet.
    #[error("permission catalogue is not ready")]
    CatalogueNotReady,

    /// User is not authenticated or not allowed to access a resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{AppError, NonEmptyString, TenantId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn tenant_id_formats_as_uuid() {
        let tenant_id = TenantId::new();
        assert_eq!(tenant_id.to_string().len(), 36);
    }

    #[test]
    fn tenant_id_parses_its_display_form() {
        let tenant_id = TenantId::new();
        let parsed = TenantId::from_str(tenant_id.to_string().as_str());
        assert_eq!(parsed.ok(), Some(tenant_id));
        assert!(TenantId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn invalid_permission_ids_message_lists_ids() {
        let error = AppError::InvalidPermissionIds(vec![
            "project.archive".to_owned(),
            "client.merge".to_owned(),
        ]);
        assert_eq!(
            error.to_string(),
            "invalid permission ids: project.archive, client.merge"
        );
    }
}
