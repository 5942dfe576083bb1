use std::str::FromStr;

use qryvanta_core::AppError;
use serde::{Deserialize, Serialize};

/// Permissions enforced by the permission administration endpoints themselves.
///
/// They are ordinary catalogue ids; the built-in catalogue lists all of them
/// under the `security` module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPermission {
    /// Allows reading the catalogue and validating ids.
    PermissionRead,
    /// Allows creating, updating and deleting permission groups.
    PermissionGroupManage,
    /// Allows replacing principal group assignments and overrides.
    AssignmentManage,
    /// Allows reloading the catalogue at runtime.
    CatalogueReload,
}

impl AdminPermission {
    /// Returns the catalogue id of this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionRead => "security.permission.read",
            Self::PermissionGroupManage => "security.permission_group.manage",
            Self::AssignmentManage => "security.assignment.manage",
            Self::CatalogueReload => "security.catalogue.reload",
        }
    }

    /// Returns the catalogue label of this permission.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::PermissionRead => "Read permission catalogue",
            Self::PermissionGroupManage => "Manage permission groups",
            Self::AssignmentManage => "Manage principal assignments",
            Self::CatalogueReload => "Reload permission catalogue",
        }
    }

    /// Returns all administrative permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AdminPermission] = &[
            AdminPermission::PermissionRead,
            AdminPermission::PermissionGroupManage,
            AdminPermission::AssignmentManage,
            AdminPermission::CatalogueReload,
        ];

        ALL
    }
}

impl FromStr for AdminPermission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|permission| permission.as_str() == value)
            .copied()
            .ok_or_else(|| {
                AppError::Validation(format!("unknown administrative permission '{value}'"))
            })
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a permission group is created.
    PermissionGroupCreated,
    /// Emitted when a permission group is updated.
    PermissionGroupUpdated,
    /// Emitted when a permission group is deleted.
    PermissionGroupDeleted,
    /// Emitted when the default group of a scope changes.
    PermissionGroupDefaultChanged,
    /// Emitted when a principal assignment is replaced.
    PrincipalAssignmentSaved,
    /// Emitted when the catalogue is reloaded.
    PermissionCatalogueReloaded,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionGroupCreated => "security.permission_group.created",
            Self::PermissionGroupUpdated => "security.permission_group.updated",
            Self::PermissionGroupDeleted => "security.permission_group.deleted",
            Self::PermissionGroupDefaultChanged => "security.permission_group.default_changed",
            Self::PrincipalAssignmentSaved => "security.assignment.saved",
            Self::PermissionCatalogueReloaded => "security.catalogue.reloaded",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::AdminPermission;

    #[test]
    fn admin_permission_roundtrip_storage_value() {
        let permission = AdminPermission::PermissionGroupManage;
        let restored = AdminPermission::from_str(permission.as_str());
        assert_eq!(restored.ok(), Some(permission));
    }

    #[test]
    fn unknown_admin_permission_is_rejected() {
        assert!(AdminPermission::from_str("security.role.manage").is_err());
    }
}
