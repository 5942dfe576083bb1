use std::sync::Arc;

use qryvanta_application::{
    AuditRepository, CatalogueSource, PermissionGroupRepository, PrincipalAssignmentRepository,
};
use qryvanta_infrastructure::{
    BuiltinCatalogueSource, InMemoryAuditRepository, InMemoryPermissionGroupRepository,
    InMemoryPrincipalAssignmentRepository, JsonFileCatalogueSource, PostgresAuditRepository,
    PostgresPermissionGroupRepository, PostgresPrincipalAssignmentRepository,
};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, CatalogueSourceConfig};

pub(super) struct RepositorySet {
    pub(super) group_repository: Arc<dyn PermissionGroupRepository>,
    pub(super) assignment_repository: Arc<dyn PrincipalAssignmentRepository>,
    pub(super) audit_repository: Arc<dyn AuditRepository>,
}

pub(super) fn build_repository_set(pool: Option<&PgPool>) -> RepositorySet {
    match pool {
        Some(pool) => {
            info!("using postgres permission stores");
            RepositorySet {
                group_repository: Arc::new(PostgresPermissionGroupRepository::new(pool.clone())),
                assignment_repository: Arc::new(PostgresPrincipalAssignmentRepository::new(
                    pool.clone(),
                )),
                audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
            }
        }
        None => {
            warn!("DATABASE_URL is not set, permission stores are in-memory only");
            RepositorySet {
                group_repository: Arc::new(InMemoryPermissionGroupRepository::new()),
                assignment_repository: Arc::new(InMemoryPrincipalAssignmentRepository::new()),
                audit_repository: Arc::new(InMemoryAuditRepository::new()),
            }
        }
    }
}

pub(super) fn build_catalogue_source(config: &ApiConfig) -> Arc<dyn CatalogueSource> {
    match &config.catalogue_source {
        CatalogueSourceConfig::Builtin => Arc::new(BuiltinCatalogueSource),
        CatalogueSourceConfig::JsonFile(path) => Arc::new(JsonFileCatalogueSource::new(path)),
    }
}
