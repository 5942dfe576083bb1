use qryvanta_application::{
    AuthorizationService, PermissionAdminService, PermissionCatalogueService,
    PermissionGroupService, PermissionResolutionService, PermissionValidationService,
    PrincipalAssignmentService,
};
use qryvanta_core::AppError;
use sqlx::PgPool;
use tracing::info;

use crate::api_config::{ApiConfig, ResolutionCacheBackend};
use crate::state::AppState;

use super::redis_client::build_redis_client;

mod bootstrap;
mod caches;
mod repositories;

pub async fn build_app_state(pool: Option<PgPool>, config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let repositories = repositories::build_repository_set(pool.as_ref());

    let catalogue_service =
        PermissionCatalogueService::new(repositories::build_catalogue_source(config));
    let catalogue = catalogue_service.load().await?;
    info!(
        version = catalogue.version(),
        permissions = catalogue.len(),
        "permission catalogue ready"
    );

    let validation_service = PermissionValidationService::new(catalogue_service.clone());
    let mut resolution_service = PermissionResolutionService::new(
        repositories.group_repository.clone(),
        validation_service.clone(),
    );
    if let Some(cache) = caches::build_resolution_cache(config, redis_client.clone())? {
        resolution_service =
            resolution_service.with_cache(cache, config.resolution_cache_ttl_seconds);
    }

    let authorization_service = AuthorizationService::new(
        repositories.assignment_repository.clone(),
        resolution_service.clone(),
    );

    if let Some(admin) = &config.bootstrap_admin {
        bootstrap::seed_bootstrap_admin(repositories.assignment_repository.as_ref(), admin)
            .await?;
    }

    Ok(AppState {
        permission_admin_service: PermissionAdminService::new(
            authorization_service.clone(),
            catalogue_service.clone(),
            validation_service.clone(),
            resolution_service.clone(),
            repositories.audit_repository.clone(),
        ),
        permission_group_service: PermissionGroupService::new(
            authorization_service.clone(),
            repositories.group_repository.clone(),
            repositories.assignment_repository.clone(),
            validation_service.clone(),
            resolution_service,
            repositories.audit_repository.clone(),
        )
        .with_platform_tenant(config.platform_tenant_id),
        assignment_service: PrincipalAssignmentService::new(
            authorization_service,
            repositories.assignment_repository,
            repositories.group_repository,
            validation_service,
            repositories.audit_repository,
        ),
        catalogue_service,
        postgres_pool: pool,
        redis_client,
        redis_required: config.resolution_cache_backend == ResolutionCacheBackend::Redis,
    })
}
