//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignment;
mod builtin_catalogue;
mod catalogue;
mod group;
mod security;

pub use assignment::{EffectivePermissions, PrincipalPermissionAssignment};
pub use builtin_catalogue::builtin_catalogue_definition;
pub use catalogue::{
    CatalogueDefinition, CatalogueEntry, PermissionCatalogue, PermissionNode, PermissionTreeNode,
    ValidationResult, validate_permission_id,
};
pub use group::{GroupScope, PermissionGroup};
pub use security::{AdminPermission, AuditAction};
