use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Groups and overrides attached to one principal.
///
/// Sets are ordered so equal assignments produce equal cache keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalPermissionAssignment {
    /// Assigned permission groups.
    pub group_ids: BTreeSet<Uuid>,
    /// Permissions granted outside any group.
    pub direct_permission_ids: BTreeSet<String>,
    /// Permissions removed even when granted through a group.
    pub revoked_permission_ids: BTreeSet<String>,
}

impl PrincipalPermissionAssignment {
    /// Returns whether the assignment carries no grants or revocations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.group_ids.is_empty()
            && self.direct_permission_ids.is_empty()
            && self.revoked_permission_ids.is_empty()
    }
}

/// Resolved permission set enforced at authorization checkpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    /// Permissions the principal holds.
    pub permission_ids: BTreeSet<String>,
    /// Assigned groups that no longer exist or are not visible.
    pub dropped_group_ids: Vec<Uuid>,
    /// Granted ids that are unknown to the catalogue.
    pub dropped_permission_ids: Vec<String>,
    /// Catalogue version the set was resolved against.
    pub catalogue_version: u64,
}

impl EffectivePermissions {
    /// Returns whether the permission is part of the effective set.
    #[must_use]
    pub fn contains(&self, permission_id: &str) -> bool {
        self.permission_ids.contains(permission_id)
    }
}
