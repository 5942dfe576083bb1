use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use qryvanta_application::{CacheGeneration, ResolutionCache, ResolutionCacheKey};
use qryvanta_core::{AppResult, TenantId};
use qryvanta_domain::EffectivePermissions;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct ResolutionCacheEntry {
    value: EffectivePermissions,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Generations {
    global: u64,
    tenants: HashMap<TenantId, u64>,
}

/// In-process cache adapter for resolved permission sets.
///
/// Invalidation bumps a generation counter and drops matching entries; keys
/// built from an older generation can no longer hit.
#[derive(Default)]
pub struct InMemoryResolutionCache {
    generations: RwLock<Generations>,
    entries: RwLock<HashMap<ResolutionCacheKey, ResolutionCacheEntry>>,
}

impl InMemoryResolutionCache {
    /// Creates an empty resolution cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResolutionCache for InMemoryResolutionCache {
    async fn generation(&self, tenant_id: TenantId) -> AppResult<CacheGeneration> {
        let generations = self.generations.read().await;
        Ok(CacheGeneration {
            global: generations.global,
            tenant: generations
                .tenants
                .get(&tenant_id)
                .copied()
                .unwrap_or_default(),
        })
    }

    async fn get(&self, key: &ResolutionCacheKey) -> AppResult<Option<EffectivePermissions>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
        }

        Ok(None)
    }

    async fn put(
        &self,
        key: ResolutionCacheKey,
        value: EffectivePermissions,
        ttl_seconds: u32,
    ) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(ttl_seconds)))
            .unwrap_or(now);

        self.entries
            .write()
            .await
            .insert(key, ResolutionCacheEntry { value, expires_at });

        Ok(())
    }

    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        *self
            .generations
            .write()
            .await
            .tenants
            .entry(tenant_id)
            .or_default() += 1;

        self.entries
            .write()
            .await
            .retain(|key, _| key.tenant_id != tenant_id);

        Ok(())
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        self.generations.write().await.global += 1;
        self.entries.write().await.clear();
        Ok(())
    }
}
