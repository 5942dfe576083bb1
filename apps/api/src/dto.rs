mod assignments;
mod common;
mod groups;
mod permissions;

pub use assignments::{PrincipalAssignmentResponse, SavePrincipalAssignmentRequest};
pub use common::{HealthDependencyStatus, HealthResponse};
pub use groups::{
    CreatePermissionGroupRequest, GroupScopeQuery, PermissionGroupResponse,
    UpdatePermissionGroupRequest,
};
pub use permissions::{
    CatalogueReloadResponse, EffectivePermissionsResponse, PermissionNodeResponse,
    PermissionTreeNodeResponse, ValidatePermissionsRequest, ValidatePermissionsResponse,
};
