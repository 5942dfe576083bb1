//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod file_catalogue_source;
mod in_memory_audit_repository;
mod in_memory_permission_group_repository;
mod in_memory_principal_assignment_repository;
mod in_memory_resolution_cache;
mod postgres_audit_repository;
mod postgres_permission_group_repository;
mod postgres_principal_assignment_repository;
mod redis_resolution_cache;

pub use file_catalogue_source::{BuiltinCatalogueSource, JsonFileCatalogueSource};
pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_permission_group_repository::InMemoryPermissionGroupRepository;
pub use in_memory_principal_assignment_repository::InMemoryPrincipalAssignmentRepository;
pub use in_memory_resolution_cache::InMemoryResolutionCache;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_permission_group_repository::PostgresPermissionGroupRepository;
pub use postgres_principal_assignment_repository::PostgresPrincipalAssignmentRepository;
pub use redis_resolution_cache::RedisResolutionCache;
