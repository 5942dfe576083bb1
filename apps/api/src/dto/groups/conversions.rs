use qryvanta_application::{
    CreatePermissionGroupInput, GroupScopeSelector, UpdatePermissionGroupInput,
};
use qryvanta_core::{AppError, AppResult};
use qryvanta_domain::{GroupScope, PermissionGroup};

use super::{
    CreatePermissionGroupRequest, GroupScopeQuery, PermissionGroupResponse,
    UpdatePermissionGroupRequest,
};

fn parse_scope_selector(value: Option<&str>) -> AppResult<GroupScopeSelector> {
    match value.map(str::trim) {
        None | Some("") | Some("tenant") => Ok(GroupScopeSelector::Tenant),
        Some("global") => Ok(GroupScopeSelector::Global),
        Some(other) => Err(AppError::Validation(format!(
            "scope must be 'tenant' or 'global', got '{other}'"
        ))),
    }
}

impl GroupScopeQuery {
    pub fn selector(&self) -> AppResult<GroupScopeSelector> {
        parse_scope_selector(self.scope.as_deref())
    }
}

impl TryFrom<CreatePermissionGroupRequest> for CreatePermissionGroupInput {
    type Error = AppError;

    fn try_from(value: CreatePermissionGroupRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            scope: parse_scope_selector(value.scope.as_deref())?,
            name: value.name,
            description: value.description,
            permission_ids: value.permission_ids,
            is_default: value.is_default,
        })
    }
}

impl From<UpdatePermissionGroupRequest> for UpdatePermissionGroupInput {
    fn from(value: UpdatePermissionGroupRequest) -> Self {
        Self {
            name: value.name,
            description: value.description,
            permission_ids: value.permission_ids,
            is_default: value.is_default,
        }
    }
}

impl From<PermissionGroup> for PermissionGroupResponse {
    fn from(value: PermissionGroup) -> Self {
        let (scope, tenant_id) = match value.scope() {
            GroupScope::Global => ("global", None),
            GroupScope::Tenant(tenant_id) => ("tenant", Some(tenant_id.to_string())),
        };

        Self {
            group_id: value.group_id().to_string(),
            scope: scope.to_owned(),
            tenant_id,
            name: value.name().to_owned(),
            description: value.description().map(ToOwned::to_owned),
            permission_ids: value.permission_ids().iter().cloned().collect(),
            is_default: value.is_default(),
            created_at: value.created_at().to_rfc3339(),
            updated_at: value.updated_at().to_rfc3339(),
        }
    }
}
