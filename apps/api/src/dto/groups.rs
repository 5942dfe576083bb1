use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

mod conversions;

/// API representation of a permission group.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-group-response.ts"
)]
pub struct PermissionGroupResponse {
    pub group_id: String,
    /// `tenant` or `global`.
    pub scope: String,
    pub tenant_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub permission_ids: Vec<String>,
    pub is_default: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Query string selecting the group scope.
#[derive(Debug, Default, Deserialize)]
pub struct GroupScopeQuery {
    pub scope: Option<String>,
}

/// Incoming payload for permission group creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-permission-group-request.ts"
)]
pub struct CreatePermissionGroupRequest {
    #[serde(default)]
    pub scope: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permission_ids: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Incoming patch for permission group updates.
///
/// An explicit `"description": null` clears the description while an
/// absent field keeps it.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-permission-group-request.ts"
)]
pub struct UpdatePermissionGroupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present_field")]
    #[ts(type = "string | null")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub permission_ids: Option<Vec<String>>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

fn present_field<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
