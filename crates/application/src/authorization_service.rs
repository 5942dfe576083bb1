use std::sync::Arc;

use qryvanta_core::{AppError, AppResult, TenantId, UserIdentity};
use qryvanta_domain::{AdminPermission, EffectivePermissions};

use crate::{PermissionResolutionService, PrincipalAssignmentRepository};

/// Application service for tenant-scoped authorization checks.
///
/// Every checkpoint resolves the principal's assignment through the
/// resolution engine.
#[derive(Clone)]
pub struct AuthorizationService {
    assignments: Arc<dyn PrincipalAssignmentRepository>,
    resolution: PermissionResolutionService,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(
        assignments: Arc<dyn PrincipalAssignmentRepository>,
        resolution: PermissionResolutionService,
    ) -> Self {
        Self {
            assignments,
            resolution,
        }
    }

    /// Returns the effective permissions of a subject in a tenant.
    pub async fn effective_permissions(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<EffectivePermissions> {
        let assignment = self.assignments.find_assignment(tenant_id, subject).await?;
        self.resolution.resolve(tenant_id, &assignment).await
    }

    /// Ensures a subject holds the permission in the tenant scope.
    pub async fn require_permission(
        &self,
        tenant_id: TenantId,
        subject: &str,
        permission_id: &str,
    ) -> AppResult<()> {
        if self.has_permission(tenant_id, subject, permission_id).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{subject}' is missing permission '{permission_id}' in tenant '{tenant_id}'"
        )))
    }

    /// Returns whether the subject currently holds the permission.
    pub async fn has_permission(
        &self,
        tenant_id: TenantId,
        subject: &str,
        permission_id: &str,
    ) -> AppResult<bool> {
        Ok(self
            .effective_permissions(tenant_id, subject)
            .await?
            .contains(permission_id))
    }

    pub(crate) async fn require_admin(
        &self,
        actor: &UserIdentity,
        permission: AdminPermission,
    ) -> AppResult<()> {
        self.require_permission(actor.tenant_id(), actor.subject(), permission.as_str())
            .await
    }
}
