use std::sync::Arc;

use qryvanta_core::{AppResult, UserIdentity};
use qryvanta_domain::{
    AdminPermission, AuditAction, EffectivePermissions, PermissionNode, PermissionTreeNode,
    ValidationResult,
};

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, PermissionCatalogueService,
    PermissionResolutionService, PermissionValidationService,
};

/// Outcome of a catalogue reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogueReloadSummary {
    /// Version now enforced.
    pub version: u64,
    /// Number of permissions in the new catalogue.
    pub permission_count: usize,
}

/// Administrative facade over the catalogue and validation engine.
#[derive(Clone)]
pub struct PermissionAdminService {
    authorization_service: AuthorizationService,
    catalogue: PermissionCatalogueService,
    validation: PermissionValidationService,
    resolution: PermissionResolutionService,
    audit_repository: Arc<dyn AuditRepository>,
}

impl PermissionAdminService {
    /// Creates a new admin service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        catalogue: PermissionCatalogueService,
        validation: PermissionValidationService,
        resolution: PermissionResolutionService,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            catalogue,
            validation,
            resolution,
            audit_repository,
        }
    }

    /// Returns the permission forest.
    pub async fn get_tree(&self, actor: &UserIdentity) -> AppResult<Vec<PermissionTreeNode>> {
        self.require_read(actor).await?;
        self.catalogue.get_tree()
    }

    /// Returns every permission id in depth-first pre-order.
    pub async fn get_all(&self, actor: &UserIdentity) -> AppResult<Vec<String>> {
        self.require_read(actor).await?;
        self.catalogue.get_all()
    }

    /// Returns one catalogue node.
    pub async fn get_node(&self, actor: &UserIdentity, id: &str) -> AppResult<PermissionNode> {
        self.require_read(actor).await?;
        self.catalogue.get_node(id)
    }

    /// Partitions ids against the current catalogue.
    pub async fn validate(
        &self,
        actor: &UserIdentity,
        ids: &[String],
    ) -> AppResult<ValidationResult> {
        self.require_read(actor).await?;
        self.validation.validate(ids)
    }

    /// Returns the actor's own effective permissions.
    pub async fn effective_permissions(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<EffectivePermissions> {
        self.authorization_service
            .effective_permissions(actor.tenant_id(), actor.subject())
            .await
    }

    /// Re-reads the catalogue source and publishes the new snapshot.
    ///
    /// A failed reload keeps the previous catalogue in force.
    pub async fn reload_catalogue(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<CatalogueReloadSummary> {
        self.authorization_service
            .require_admin(actor, AdminPermission::CatalogueReload)
            .await?;

        let catalogue = self.catalogue.load().await?;
        self.resolution.invalidate_all().await?;

        let summary = CatalogueReloadSummary {
            version: catalogue.version(),
            permission_count: catalogue.len(),
        };

        self.audit_repository
            .append_event(AuditEvent::by_actor(
                actor,
                AuditAction::PermissionCatalogueReloaded,
                "permission_catalogue",
                summary.version.to_string(),
                format!("loaded {} permissions", summary.permission_count),
            ))
            .await?;

        Ok(summary)
    }

    async fn require_read(&self, actor: &UserIdentity) -> AppResult<()> {
        self.authorization_service
            .require_admin(actor, AdminPermission::PermissionRead)
            .await
    }
}
