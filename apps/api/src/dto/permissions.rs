use qryvanta_application::CatalogueReloadSummary;
use qryvanta_domain::{EffectivePermissions, PermissionNode, PermissionTreeNode, ValidationResult};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Nested catalogue subtree.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-tree-node-response.ts"
)]
pub struct PermissionTreeNodeResponse {
    pub id: String,
    pub label: String,
    pub children: Vec<PermissionTreeNodeResponse>,
}

impl From<PermissionTreeNode> for PermissionTreeNodeResponse {
    fn from(value: PermissionTreeNode) -> Self {
        Self {
            id: value.id,
            label: value.label,
            children: value.children.into_iter().map(Self::from).collect(),
        }
    }
}

/// One catalogue node with its direct relations.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-node-response.ts"
)]
pub struct PermissionNodeResponse {
    pub id: String,
    pub label: String,
    pub parent_id: Option<String>,
    pub children: Vec<String>,
}

impl From<PermissionNode> for PermissionNodeResponse {
    fn from(value: PermissionNode) -> Self {
        Self {
            id: value.id().to_owned(),
            label: value.label().to_owned(),
            parent_id: value.parent_id().map(ToOwned::to_owned),
            children: value.children().to_vec(),
        }
    }
}

/// Incoming payload for permission id validation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/validate-permissions-request.ts"
)]
pub struct ValidatePermissionsRequest {
    pub permissions: Vec<String>,
}

/// Known and unknown ids of a validation request.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/validate-permissions-response.ts"
)]
pub struct ValidatePermissionsResponse {
    pub is_valid: bool,
    pub valid_ids: Vec<String>,
    pub invalid_ids: Vec<String>,
}

impl From<ValidationResult> for ValidatePermissionsResponse {
    fn from(value: ValidationResult) -> Self {
        Self {
            is_valid: value.is_valid(),
            valid_ids: value.valid_ids,
            invalid_ids: value.invalid_ids,
        }
    }
}

/// Resolved permission set of a principal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/effective-permissions-response.ts"
)]
pub struct EffectivePermissionsResponse {
    pub permission_ids: Vec<String>,
    pub dropped_group_ids: Vec<String>,
    pub dropped_permission_ids: Vec<String>,
    pub catalogue_version: u64,
}

impl From<EffectivePermissions> for EffectivePermissionsResponse {
    fn from(value: EffectivePermissions) -> Self {
        Self {
            permission_ids: value.permission_ids.into_iter().collect(),
            dropped_group_ids: value
                .dropped_group_ids
                .iter()
                .map(ToString::to_string)
                .collect(),
            dropped_permission_ids: value.dropped_permission_ids,
            catalogue_version: value.catalogue_version,
        }
    }
}

/// Result of a catalogue reload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/catalogue-reload-response.ts"
)]
pub struct CatalogueReloadResponse {
    pub version: u64,
    pub permission_count: usize,
}

impl From<CatalogueReloadSummary> for CatalogueReloadResponse {
    fn from(value: CatalogueReloadSummary) -> Self {
        Self {
            version: value.version,
            permission_count: value.permission_count,
        }
    }
}
