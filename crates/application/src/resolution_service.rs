use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use qryvanta_core::{AppResult, TenantId};
use qryvanta_domain::{EffectivePermissions, GroupScope, PrincipalPermissionAssignment};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    PermissionGroupRepository, PermissionValidationService, ResolutionCache, ResolutionCacheKey,
};

/// Computes a principal's effective permission set.
///
/// effective = (groups ∪ direct) − revoked, restricted to catalogue ids.
#[derive(Clone)]
pub struct PermissionResolutionService {
    group_repository: Arc<dyn PermissionGroupRepository>,
    validation: PermissionValidationService,
    cache: Option<Arc<dyn ResolutionCache>>,
    cache_ttl_seconds: u32,
}

impl PermissionResolutionService {
    /// Creates a resolution service without cache.
    #[must_use]
    pub fn new(
        group_repository: Arc<dyn PermissionGroupRepository>,
        validation: PermissionValidationService,
    ) -> Self {
        Self {
            group_repository,
            validation,
            cache: None,
            cache_ttl_seconds: 0,
        }
    }

    /// Enables caching of resolved sets.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ResolutionCache>, ttl_seconds: u32) -> Self {
        self.cache = Some(cache);
        self.cache_ttl_seconds = ttl_seconds;
        self
    }

    /// Resolves the assignment of a principal of `tenant_id`.
    pub async fn resolve(
        &self,
        tenant_id: TenantId,
        assignment: &PrincipalPermissionAssignment,
    ) -> AppResult<EffectivePermissions> {
        let Some(cache) = self.active_cache() else {
            return self.resolve_uncached(tenant_id, assignment).await;
        };

        // Generation is read before any group is fetched.
        let (catalogue_version, catalogue_fingerprint) = self.validation.catalogue_identity()?;
        let key = ResolutionCacheKey {
            tenant_id,
            assignment: assignment.clone(),
            catalogue_fingerprint,
            generation: cache.generation(tenant_id).await?,
        };

        if let Some(mut cached) = cache.get(&key).await? {
            debug!(%tenant_id, "resolved permissions served from cache");
            cached.catalogue_version = catalogue_version;
            return Ok(cached);
        }

        let resolved = self.resolve_uncached(tenant_id, assignment).await?;
        if resolved.catalogue_version == catalogue_version {
            cache
                .put(key, resolved.clone(), self.cache_ttl_seconds)
                .await?;
        }

        Ok(resolved)
    }

    /// Resolves without consulting the cache.
    pub async fn resolve_uncached(
        &self,
        tenant_id: TenantId,
        assignment: &PrincipalPermissionAssignment,
    ) -> AppResult<EffectivePermissions> {
        let requested: Vec<Uuid> = assignment.group_ids.iter().copied().collect();
        let groups: HashMap<Uuid, _> = if requested.is_empty() {
            HashMap::new()
        } else {
            self.group_repository
                .find_groups(&requested)
                .await?
                .into_iter()
                .filter(|group| group.scope().is_visible_to(tenant_id))
                .map(|group| (group.group_id(), group))
                .collect()
        };

        let mut granted = BTreeSet::new();
        let mut dropped_group_ids = Vec::new();
        for group_id in &requested {
            match groups.get(group_id) {
                Some(group) => granted.extend(group.permission_ids().iter().cloned()),
                None => dropped_group_ids.push(*group_id),
            }
        }
        if !dropped_group_ids.is_empty() {
            warn!(
                %tenant_id,
                dropped = dropped_group_ids.len(),
                "skipping assigned permission groups that no longer exist"
            );
        }

        granted.extend(assignment.direct_permission_ids.iter().cloned());
        granted.retain(|id| !assignment.revoked_permission_ids.contains(id));

        let known = self.validation.drop_unknown(granted)?;

        Ok(EffectivePermissions {
            permission_ids: known.kept,
            dropped_group_ids,
            dropped_permission_ids: known.dropped,
            catalogue_version: known.catalogue_version,
        })
    }

    /// Invalidates cached sets affected by a mutation in `scope`.
    pub async fn invalidate_scope(&self, scope: GroupScope) -> AppResult<()> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };

        match scope {
            GroupScope::Global => cache.invalidate_all().await,
            GroupScope::Tenant(tenant_id) => cache.invalidate_tenant(tenant_id).await,
        }
    }

    /// Invalidates every cached set.
    pub async fn invalidate_all(&self) -> AppResult<()> {
        match &self.cache {
            Some(cache) => cache.invalidate_all().await,
            None => Ok(()),
        }
    }

    fn active_cache(&self) -> Option<&Arc<dyn ResolutionCache>> {
        self.cache
            .as_ref()
            .filter(|_| self.cache_ttl_seconds > 0)
    }
}
