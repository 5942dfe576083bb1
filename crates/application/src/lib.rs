//! Application services and ports.

#![forbid(unsafe_code)]

mod assignment_service;
mod audit_ports;
mod authorization_service;
mod catalogue_service;
mod permission_admin_service;
mod permission_group_ports;
mod permission_group_service;
mod resolution_cache_ports;
mod resolution_service;
mod scope_locks;
mod validation_service;

#[cfg(test)]
mod test_support;

pub use assignment_service::PrincipalAssignmentService;
pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_service::AuthorizationService;
pub use catalogue_service::{CatalogueSource, PermissionCatalogueService};
pub use permission_admin_service::{CatalogueReloadSummary, PermissionAdminService};
pub use permission_group_ports::{
    CreatePermissionGroupInput, GroupScopeSelector, PermissionGroupRepository,
    PrincipalAssignmentRepository, PrincipalReference, UpdatePermissionGroupInput,
};
pub use permission_group_service::PermissionGroupService;
pub use resolution_cache_ports::{CacheGeneration, ResolutionCache, ResolutionCacheKey};
pub use resolution_service::PermissionResolutionService;
pub use validation_service::PermissionValidationService;
