use async_trait::async_trait;
use qryvanta_core::{AppResult, TenantId};
use qryvanta_domain::{EffectivePermissions, PrincipalPermissionAssignment};

/// Invalidation counters observed before a resolution started.
///
/// Group mutations bump the counter of their scope after the write lands, so
/// entries stored under an older generation are never read again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CacheGeneration {
    /// Counter bumped on global-scope mutations and catalogue reloads.
    pub global: u64,
    /// Counter bumped on mutations in the principal's tenant scope.
    pub tenant: u64,
}

/// Cache key for one resolved assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionCacheKey {
    /// Tenant the principal resolves in.
    pub tenant_id: TenantId,
    /// Sorted groups and overrides.
    pub assignment: PrincipalPermissionAssignment,
    /// Content fingerprint of the catalogue the value was resolved against.
    ///
    /// Stable across processes, so caches shared between replicas never mix
    /// results of different catalogues.
    pub catalogue_fingerprint: String,
    /// Invalidation generation at resolution start.
    pub generation: CacheGeneration,
}

/// Optional cache port for resolved permission sets.
#[async_trait]
pub trait ResolutionCache: Send + Sync {
    /// Returns the current invalidation generation for a tenant.
    async fn generation(&self, tenant_id: TenantId) -> AppResult<CacheGeneration>;

    /// Returns a cached value.
    async fn get(&self, key: &ResolutionCacheKey) -> AppResult<Option<EffectivePermissions>>;

    /// Stores a value with ttl.
    async fn put(
        &self,
        key: ResolutionCacheKey,
        value: EffectivePermissions,
        ttl_seconds: u32,
    ) -> AppResult<()>;

    /// Invalidates every entry of one tenant.
    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()>;

    /// Invalidates every entry.
    async fn invalidate_all(&self) -> AppResult<()>;
}
