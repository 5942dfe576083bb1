use std::sync::Arc;

use chrono::Utc;
use qryvanta_core::{AppError, AppResult, TenantId, UserIdentity};
use qryvanta_domain::{AdminPermission, AuditAction, GroupScope, PermissionGroup};
use uuid::Uuid;

use crate::scope_locks::ScopeLocks;
use crate::{
    AuditEvent, AuditRepository, AuthorizationService, CreatePermissionGroupInput,
    GroupScopeSelector, PermissionGroupRepository, PermissionResolutionService,
    PermissionValidationService, PrincipalAssignmentRepository, UpdatePermissionGroupInput,
};

const RESOURCE_TYPE: &str = "permission_group";

/// Application service for permission group administration.
///
/// Writes are serialized per scope and every write re-validates the group's
/// permission ids against the current catalogue.
#[derive(Clone)]
pub struct PermissionGroupService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn PermissionGroupRepository>,
    assignments: Arc<dyn PrincipalAssignmentRepository>,
    validation: PermissionValidationService,
    resolution: PermissionResolutionService,
    audit_repository: Arc<dyn AuditRepository>,
    scope_locks: Arc<ScopeLocks>,
    platform_tenant_id: Option<TenantId>,
}

impl PermissionGroupService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn PermissionGroupRepository>,
        assignments: Arc<dyn PrincipalAssignmentRepository>,
        validation: PermissionValidationService,
        resolution: PermissionResolutionService,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            assignments,
            validation,
            resolution,
            audit_repository,
            scope_locks: Arc::new(ScopeLocks::default()),
            platform_tenant_id: None,
        }
    }

    /// Allows principals of `tenant_id` to write global groups.
    #[must_use]
    pub fn with_platform_tenant(mut self, tenant_id: Option<TenantId>) -> Self {
        self.platform_tenant_id = tenant_id;
        self
    }

    /// Lists groups of the selected scope, oldest first.
    pub async fn list_groups(
        &self,
        actor: &UserIdentity,
        scope: GroupScopeSelector,
    ) -> AppResult<Vec<PermissionGroup>> {
        self.authorization_service
            .require_admin(actor, AdminPermission::PermissionRead)
            .await?;

        self.repository
            .list_groups(scope.resolve(actor.tenant_id()))
            .await
    }

    /// Returns one group visible to the actor.
    pub async fn get_group(
        &self,
        actor: &UserIdentity,
        group_id: Uuid,
    ) -> AppResult<PermissionGroup> {
        self.authorization_service
            .require_admin(actor, AdminPermission::PermissionRead)
            .await?;

        self.find_visible_group(actor, group_id).await
    }

    /// Creates a group and emits audit events.
    pub async fn create_group(
        &self,
        actor: &UserIdentity,
        input: CreatePermissionGroupInput,
    ) -> AppResult<PermissionGroup> {
        let scope = input.scope.resolve(actor.tenant_id());
        self.require_group_write(actor, scope).await?;

        let group = PermissionGroup::new(
            scope,
            input.name,
            input.description,
            input.permission_ids,
            input.is_default,
            Utc::now(),
        )?;

        let _guard = self.scope_locks.lock(scope).await?;
        self.ensure_name_available(&group, None).await?;
        self.validation.require_valid(group.permission_ids())?;

        self.repository.insert_group(group.clone()).await?;
        self.resolution.invalidate_scope(scope).await?;

        self.audit_repository
            .append_event(AuditEvent::by_actor(
                actor,
                AuditAction::PermissionGroupCreated,
                RESOURCE_TYPE,
                group.group_id().to_string(),
                format!("created permission group '{}' in {scope}", group.name()),
            ))
            .await?;
        if group.is_default() {
            self.append_default_changed_event(actor, &group).await?;
        }

        Ok(group)
    }

    /// Applies a patch to a group and emits audit events.
    pub async fn update_group(
        &self,
        actor: &UserIdentity,
        group_id: Uuid,
        patch: UpdatePermissionGroupInput,
    ) -> AppResult<PermissionGroup> {
        let scope = self.find_visible_group(actor, group_id).await?.scope();
        self.require_group_write(actor, scope).await?;

        let _guard = self.scope_locks.lock(scope).await?;
        let existing = self.find_visible_group(actor, group_id).await?;
        let mut group = existing.clone();

        if let Some(name) = patch.name {
            group.rename(name)?;
        }
        if let Some(description) = patch.description {
            group.set_description(description);
        }
        if let Some(permission_ids) = patch.permission_ids {
            group.replace_permission_ids(permission_ids);
        }
        if let Some(is_default) = patch.is_default {
            group.set_default(is_default);
        }

        self.ensure_name_available(&group, Some(group_id)).await?;
        self.validation.require_valid(group.permission_ids())?;

        group.touch(Utc::now());
        self.repository.replace_group(group.clone()).await?;
        self.resolution.invalidate_scope(scope).await?;

        self.audit_repository
            .append_event(AuditEvent::by_actor(
                actor,
                AuditAction::PermissionGroupUpdated,
                RESOURCE_TYPE,
                group_id.to_string(),
                format!("updated permission group '{}'", group.name()),
            ))
            .await?;
        if group.is_default() != existing.is_default() {
            self.append_default_changed_event(actor, &group).await?;
        }

        Ok(group)
    }

    /// Makes a group the default of its scope.
    pub async fn set_default_group(
        &self,
        actor: &UserIdentity,
        group_id: Uuid,
    ) -> AppResult<PermissionGroup> {
        self.update_group(
            actor,
            group_id,
            UpdatePermissionGroupInput {
                is_default: Some(true),
                ..UpdatePermissionGroupInput::default()
            },
        )
        .await
    }

    /// Deletes a group that no principal references.
    pub async fn delete_group(&self, actor: &UserIdentity, group_id: Uuid) -> AppResult<()> {
        let scope = self.find_visible_group(actor, group_id).await?.scope();
        self.require_group_write(actor, scope).await?;

        let _guard = self.scope_locks.lock(scope).await?;
        let group = self.find_visible_group(actor, group_id).await?;

        let principals = self.assignments.list_principals_with_group(group_id).await?;
        if !principals.is_empty() {
            return Err(AppError::ReferencedGroupDeletion {
                group_id: group_id.to_string(),
                principals: principals.iter().map(ToString::to_string).collect(),
            });
        }

        self.repository.delete_group(group_id).await?;
        self.resolution.invalidate_scope(scope).await?;

        self.audit_repository
            .append_event(AuditEvent::by_actor(
                actor,
                AuditAction::PermissionGroupDeleted,
                RESOURCE_TYPE,
                group_id.to_string(),
                format!("deleted permission group '{}'", group.name()),
            ))
            .await
    }

    async fn find_visible_group(
        &self,
        actor: &UserIdentity,
        group_id: Uuid,
    ) -> AppResult<PermissionGroup> {
        self.repository
            .find_group(group_id)
            .await?
            .filter(|group| group.scope().is_visible_to(actor.tenant_id()))
            .ok_or_else(|| {
                AppError::NotFound(format!("permission group '{group_id}' does not exist"))
            })
    }

    async fn require_group_write(&self, actor: &UserIdentity, scope: GroupScope) -> AppResult<()> {
        self.authorization_service
            .require_admin(actor, AdminPermission::PermissionGroupManage)
            .await?;

        if scope == GroupScope::Global && self.platform_tenant_id != Some(actor.tenant_id()) {
            return Err(AppError::Forbidden(format!(
                "tenant '{}' cannot modify global permission groups",
                actor.tenant_id()
            )));
        }

        Ok(())
    }

    async fn ensure_name_available(
        &self,
        group: &PermissionGroup,
        current_id: Option<Uuid>,
    ) -> AppResult<()> {
        let existing = self
            .repository
            .find_group_by_name(group.scope(), group.name())
            .await?;

        match existing {
            Some(existing) if Some(existing.group_id()) != current_id => {
                Err(AppError::DuplicateName(format!(
                    "permission group '{}' already exists in {}",
                    group.name(),
                    group.scope()
                )))
            }
            _ => Ok(()),
        }
    }

    async fn append_default_changed_event(
        &self,
        actor: &UserIdentity,
        group: &PermissionGroup,
    ) -> AppResult<()> {
        let detail = if group.is_default() {
            format!("'{}' is now the default group of {}", group.name(), group.scope())
        } else {
            format!("'{}' is no longer the default group of {}", group.name(), group.scope())
        };

        self.audit_repository
            .append_event(AuditEvent::by_actor(
                actor,
                AuditAction::PermissionGroupDefaultChanged,
                RESOURCE_TYPE,
                group.group_id().to_string(),
                detail,
            ))
            .await
    }
}

#[cfg(test)]
mod tests;
