//! Redis-backed resolution cache shared between API replicas.

use async_trait::async_trait;
use qryvanta_application::{CacheGeneration, ResolutionCache, ResolutionCacheKey};
use qryvanta_core::{AppError, AppResult, TenantId};
use qryvanta_domain::EffectivePermissions;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};

/// Redis implementation of the resolution cache port.
///
/// Generations live in counter keys bumped with `INCR`; entries are written
/// with `SETEX` under keys that embed the generation they were read with.
#[derive(Clone)]
pub struct RedisResolutionCache {
    client: redis::Client,
    key_prefix: String,
}

impl RedisResolutionCache {
    /// Creates a cache adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn global_generation_key(&self) -> String {
        format!("{}:generation:global", self.key_prefix)
    }

    fn tenant_generation_key(&self, tenant_id: TenantId) -> String {
        format!("{}:generation:tenant:{tenant_id}", self.key_prefix)
    }

    fn entry_key(&self, key: &ResolutionCacheKey) -> AppResult<String> {
        let assignment = serde_json::to_vec(&key.assignment).map_err(|error| {
            AppError::Internal(format!("failed to encode resolution cache key: {error}"))
        })?;
        let digest = hex::encode(Sha256::digest(assignment));

        Ok(format!(
            "{}:entry:{}:c{}:g{}.{}:{digest}",
            self.key_prefix,
            key.tenant_id,
            key.catalogue_fingerprint,
            key.generation.global,
            key.generation.tenant
        ))
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    async fn bump(&self, key: String) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let _: u64 = connection.incr(key, 1_u64).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to bump resolution cache generation: {error}"
            ))
        })?;

        Ok(())
    }
}

#[async_trait]
impl ResolutionCache for RedisResolutionCache {
    async fn generation(&self, tenant_id: TenantId) -> AppResult<CacheGeneration> {
        let mut connection = self.connection().await?;
        let (global, tenant): (Option<u64>, Option<u64>) = redis::pipe()
            .get(self.global_generation_key())
            .get(self.tenant_generation_key(tenant_id))
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to read resolution cache generation: {error}"
                ))
            })?;

        Ok(CacheGeneration {
            global: global.unwrap_or_default(),
            tenant: tenant.unwrap_or_default(),
        })
    }

    async fn get(&self, key: &ResolutionCacheKey) -> AppResult<Option<EffectivePermissions>> {
        let entry_key = self.entry_key(key)?;
        let mut connection = self.connection().await?;

        let encoded: Option<String> = connection.get(entry_key).await.map_err(|error| {
            AppError::Internal(format!("failed to read resolution cache entry: {error}"))
        })?;

        encoded
            .as_deref()
            .map(|value| {
                serde_json::from_str::<EffectivePermissions>(value).map_err(|error| {
                    AppError::Internal(format!("invalid resolution cache entry: {error}"))
                })
            })
            .transpose()
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

        let entry_key = self.entry_key(&key)?;
        let encoded = serde_json::to_string(&value).map_err(|error| {
            AppError::Internal(format!("failed to encode resolution cache entry: {error}"))
        })?;
        let mut connection = self.connection().await?;

        connection
            .set_ex(entry_key, encoded, u64::from(ttl_seconds))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to write resolution cache entry: {error}"))
            })
    }

    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        self.bump(self.tenant_generation_key(tenant_id)).await
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        self.bump(self.global_generation_key()).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use qryvanta_application::{CacheGeneration, ResolutionCacheKey};
    use qryvanta_core::TenantId;
    use qryvanta_domain::PrincipalPermissionAssignment;

    use super::RedisResolutionCache;

    fn cache() -> RedisResolutionCache {
        match redis::Client::open("redis://127.0.0.1:6379") {
            Ok(client) => RedisResolutionCache::new(client, "qryvanta:test"),
            Err(error) => panic!("client should parse: {error}"),
        }
    }

    #[test]
    fn entry_keys_embed_fingerprint_and_generation() {
        let cache = cache();
        let tenant_id = TenantId::new();
        let key = ResolutionCacheKey {
            tenant_id,
            assignment: PrincipalPermissionAssignment::default(),
            catalogue_fingerprint: "abc123".to_owned(),
            generation: CacheGeneration {
                global: 2,
                tenant: 5,
            },
        };

        let encoded = cache.entry_key(&key);
        assert!(encoded.is_ok());
        let Ok(encoded) = encoded else {
            return;
        };
        assert!(encoded.starts_with(&format!("qryvanta:test:entry:{tenant_id}:cabc123:g2.5:")));
    }

    #[test]
    fn different_assignments_produce_different_keys() {
        let cache = cache();
        let base = ResolutionCacheKey {
            tenant_id: TenantId::new(),
            assignment: PrincipalPermissionAssignment::default(),
            catalogue_fingerprint: "abc123".to_owned(),
            generation: CacheGeneration::default(),
        };
        let other = ResolutionCacheKey {
            assignment: PrincipalPermissionAssignment {
                direct_permission_ids: BTreeSet::from(["project.view".to_owned()]),
                ..PrincipalPermissionAssignment::default()
            },
            ..base.clone()
        };

        assert_ne!(cache.entry_key(&base).ok(), cache.entry_key(&other).ok());
    }
}
