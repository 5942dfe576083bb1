use qryvanta_application::{
    PermissionAdminService, PermissionCatalogueService, PermissionGroupService,
    PrincipalAssignmentService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub permission_admin_service: PermissionAdminService,
    pub permission_group_service: PermissionGroupService,
    pub assignment_service: PrincipalAssignmentService,
    pub catalogue_service: PermissionCatalogueService,
    pub postgres_pool: Option<sqlx::PgPool>,
    pub redis_client: Option<redis::Client>,
    pub redis_required: bool,
}
