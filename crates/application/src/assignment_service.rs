use std::collections::BTreeSet;
use std::sync::Arc;

use qryvanta_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use qryvanta_domain::{
    AdminPermission, AuditAction, EffectivePermissions, PrincipalPermissionAssignment,
};
use uuid::Uuid;

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, PermissionGroupRepository,
    PermissionValidationService, PrincipalAssignmentRepository,
};

/// Application service for principal group assignments and overrides.
#[derive(Clone)]
pub struct PrincipalAssignmentService {
    authorization_service: AuthorizationService,
    assignments: Arc<dyn PrincipalAssignmentRepository>,
    groups: Arc<dyn PermissionGroupRepository>,
    validation: PermissionValidationService,
    audit_repository: Arc<dyn AuditRepository>,
}

impl PrincipalAssignmentService {
    /// Creates a new assignment service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        assignments: Arc<dyn PrincipalAssignmentRepository>,
        groups: Arc<dyn PermissionGroupRepository>,
        validation: PermissionValidationService,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            assignments,
            groups,
            validation,
            audit_repository,
        }
    }

    /// Returns the stored assignment of a subject in the actor's tenant.
    pub async fn get_assignment(
        &self,
        actor: &UserIdentity,
        subject: &str,
    ) -> AppResult<PrincipalPermissionAssignment> {
        self.authorization_service
            .require_admin(actor, AdminPermission::PermissionRead)
            .await?;

        let subject = normalized_subject(subject)?;
        self.assignments
            .find_assignment(actor.tenant_id(), subject.as_str())
            .await
    }

    /// Returns the resolved permissions of a subject in the actor's tenant.
    pub async fn get_effective_permissions(
        &self,
        actor: &UserIdentity,
        subject: &str,
    ) -> AppResult<EffectivePermissions> {
        self.authorization_service
            .require_admin(actor, AdminPermission::PermissionRead)
            .await?;

        let subject = normalized_subject(subject)?;
        self.authorization_service
            .effective_permissions(actor.tenant_id(), subject.as_str())
            .await
    }

    /// Replaces the assignment of a subject in the actor's tenant.
    ///
    /// Every group must be visible to the tenant and every override id must
    /// exist in the catalogue.
    pub async fn save_assignment(
        &self,
        actor: &UserIdentity,
        subject: &str,
        assignment: PrincipalPermissionAssignment,
    ) -> AppResult<PrincipalPermissionAssignment> {
        self.authorization_service
            .require_admin(actor, AdminPermission::AssignmentManage)
            .await?;

        let subject = normalized_subject(subject)?;
        self.ensure_groups_visible(actor, &assignment.group_ids)
            .await?;
        self.validation.require_valid(
            assignment
                .direct_permission_ids
                .iter()
                .chain(assignment.revoked_permission_ids.iter()),
        )?;

        self.assignments
            .save_assignment(actor.tenant_id(), subject.as_str(), assignment.clone())
            .await?;

        self.audit_repository
            .append_event(AuditEvent::by_actor(
                actor,
                AuditAction::PrincipalAssignmentSaved,
                "principal_assignment",
                subject.as_str(),
                format!(
                    "groups={} direct={} revoked={}",
                    assignment.group_ids.len(),
                    assignment.direct_permission_ids.len(),
                    assignment.revoked_permission_ids.len()
                ),
            ))
            .await?;

        Ok(assignment)
    }

    async fn ensure_groups_visible(
        &self,
        actor: &UserIdentity,
        group_ids: &BTreeSet<Uuid>,
    ) -> AppResult<()> {
        if group_ids.is_empty() {
            return Ok(());
        }

        let requested: Vec<Uuid> = group_ids.iter().copied().collect();
        let visible: BTreeSet<Uuid> = self
            .groups
            .find_groups(&requested)
            .await?
            .into_iter()
            .filter(|group| group.scope().is_visible_to(actor.tenant_id()))
            .map(|group| group.group_id())
            .collect();

        let unknown: Vec<String> = requested
            .iter()
            .filter(|group_id| !visible.contains(group_id))
            .map(ToString::to_string)
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }

        Err(AppError::Validation(format!(
            "unknown permission groups: {}",
            unknown.join(", ")
        )))
    }
}

/// Subjects are stored and looked up trimmed.
fn normalized_subject(subject: &str) -> AppResult<NonEmptyString> {
    NonEmptyString::new(subject.trim())
}
