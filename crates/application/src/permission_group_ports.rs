use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use qryvanta_core::{AppResult, TenantId};
use qryvanta_domain::{GroupScope, PermissionGroup, PrincipalPermissionAssignment};
use uuid::Uuid;

/// Repository port for permission group records.
///
/// Implementations enforce scope+name uniqueness and keep at most one default
/// group per scope.
#[async_trait]
pub trait PermissionGroupRepository: Send + Sync {
    /// Lists groups of a scope ordered by creation time ascending.
    async fn list_groups(&self, scope: GroupScope) -> AppResult<Vec<PermissionGroup>>;

    /// Finds one group by id.
    async fn find_group(&self, group_id: Uuid) -> AppResult<Option<PermissionGroup>>;

    /// Finds the groups among `group_ids` that exist, in any order.
    async fn find_groups(&self, group_ids: &[Uuid]) -> AppResult<Vec<PermissionGroup>>;

    /// Finds a group by name within a scope.
    async fn find_group_by_name(
        &self,
        scope: GroupScope,
        name: &str,
    ) -> AppResult<Option<PermissionGroup>>;

    /// Inserts a group.
    ///
    /// When the group is default, the previous default of its scope is cleared
    /// in the same atomic write.
    async fn insert_group(&self, group: PermissionGroup) -> AppResult<()>;

    /// Replaces a stored group with the same default-swap guarantee as insert.
    async fn replace_group(&self, group: PermissionGroup) -> AppResult<()>;

    /// Deletes a group.
    async fn delete_group(&self, group_id: Uuid) -> AppResult<()>;
}

/// Principal that references a permission group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrincipalReference {
    /// Tenant of the principal.
    pub tenant_id: TenantId,
    /// Principal subject.
    pub subject: String,
}

impl Display for PrincipalReference {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}@{}", self.subject, self.tenant_id)
    }
}

/// Identity collaborator port for principal group assignments and overrides.
#[async_trait]
pub trait PrincipalAssignmentRepository: Send + Sync {
    /// Returns the assignment of a principal, empty when none is stored.
    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<PrincipalPermissionAssignment>;

    /// Replaces the assignment of a principal.
    async fn save_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
        assignment: PrincipalPermissionAssignment,
    ) -> AppResult<()>;

    /// Lists principals whose assignment includes the group.
    async fn list_principals_with_group(&self, group_id: Uuid)
    -> AppResult<Vec<PrincipalReference>>;
}

/// Scope selector used by callers acting inside a tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupScopeSelector {
    /// The caller's own tenant.
    #[default]
    Tenant,
    /// The global scope shared by every tenant.
    Global,
}

impl GroupScopeSelector {
    /// Resolves the selector for a tenant.
    #[must_use]
    pub fn resolve(self, tenant_id: TenantId) -> GroupScope {
        match self {
            Self::Tenant => GroupScope::Tenant(tenant_id),
            Self::Global => GroupScope::Global,
        }
    }
}

/// Input payload for creating permission groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionGroupInput {
    /// Target scope.
    pub scope: GroupScopeSelector,
    /// Unique group name in scope.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Catalogue permission ids bundled by the group.
    pub permission_ids: Vec<String>,
    /// Whether the group becomes the scope default.
    pub is_default: bool,
}

/// Patch payload for updating permission groups; `None` keeps a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePermissionGroupInput {
    /// New name.
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Replacement permission ids.
    pub permission_ids: Option<Vec<String>>,
    /// New default flag.
    pub is_default: Option<bool>,
}
