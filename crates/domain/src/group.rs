use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use qryvanta_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenancy boundary for group names and default-group uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tenant_id", rename_all = "snake_case")]
pub enum GroupScope {
    /// Groups shared by every tenant.
    Global,
    /// Groups owned by one tenant.
    Tenant(TenantId),
}

impl GroupScope {
    /// Returns a stable storage key for the scope.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Self::Global => "global".to_owned(),
            Self::Tenant(tenant_id) => format!("tenant:{tenant_id}"),
        }
    }

    /// Returns the owning tenant, if any.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            Self::Global => None,
            Self::Tenant(tenant_id) => Some(*tenant_id),
        }
    }

    /// Returns whether a principal of `tenant_id` may use groups of this scope.
    #[must_use]
    pub fn is_visible_to(&self, tenant_id: TenantId) -> bool {
        match self {
            Self::Global => true,
            Self::Tenant(owner) => *owner == tenant_id,
        }
    }
}

impl Display for GroupScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.storage_key().as_str())
    }
}

impl FromStr for GroupScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "global" {
            return Ok(Self::Global);
        }

        value
            .strip_prefix("tenant:")
            .ok_or_else(|| AppError::Validation(format!("unknown group scope '{value}'")))?
            .parse::<TenantId>()
            .map(Self::Tenant)
    }
}

/// Named, reusable bundle of catalogue permission ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    group_id: Uuid,
    scope: GroupScope,
    name: NonEmptyString,
    description: Option<String>,
    permission_ids: BTreeSet<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionGroup {
    /// Creates a new group stamped with `now`.
    pub fn new(
        scope: GroupScope,
        name: impl Into<String>,
        description: Option<String>,
        permission_ids: impl IntoIterator<Item = String>,
        is_default: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        Self::restore(
            Uuid::new_v4(),
            scope,
            name,
            description,
            permission_ids,
            is_default,
            now,
            now,
        )
    }

    /// Rebuilds a persisted group.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        group_id: Uuid,
        scope: GroupScope,
        name: impl Into<String>,
        description: Option<String>,
        permission_ids: impl IntoIterator<Item = String>,
        is_default: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            group_id,
            scope,
            name: normalize_name(name)?,
            description: normalize_description(description),
            permission_ids: permission_ids.into_iter().collect(),
            is_default,
            created_at,
            updated_at,
        })
    }

    /// Returns the system-generated identifier.
    #[must_use]
    pub fn group_id(&self) -> Uuid {
        self.group_id
    }

    /// Returns the owning scope.
    #[must_use]
    pub fn scope(&self) -> GroupScope {
        self.scope
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the bundled permission ids.
    #[must_use]
    pub fn permission_ids(&self) -> &BTreeSet<String> {
        &self.permission_ids
    }

    /// Returns whether this is the default group of its scope.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last mutation timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether `name` collides with this group's name.
    ///
    /// Names compare by [`PermissionGroup::name_key`].
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name_key() == Self::key_for_name(name)
    }

    /// Returns the comparison key of the group name.
    ///
    /// Stores persist this key for their uniqueness checks.
    #[must_use]
    pub fn name_key(&self) -> String {
        Self::key_for_name(self.name.as_str())
    }

    /// Returns the comparison key of a candidate name: trimmed, Unicode lowercase.
    #[must_use]
    pub fn key_for_name(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Renames the group.
    pub fn rename(&mut self, name: impl Into<String>) -> AppResult<()> {
        self.name = normalize_name(name)?;
        Ok(())
    }

    /// Replaces the description.
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = normalize_description(description);
    }

    /// Replaces the bundled permission ids.
    pub fn replace_permission_ids(&mut self, permission_ids: impl IntoIterator<Item = String>) {
        self.permission_ids = permission_ids.into_iter().collect();
    }

    /// Sets or clears the default flag.
    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }

    /// Records a mutation at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

fn normalize_name(name: impl Into<String>) -> AppResult<NonEmptyString> {
    let name = name.into();
    NonEmptyString::new(name.trim())
        .map_err(|_| AppError::Validation("permission group name must not be empty".to_owned()))
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
