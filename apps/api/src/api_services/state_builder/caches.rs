use std::sync::Arc;

use qryvanta_application::ResolutionCache;
use qryvanta_core::{AppError, AppResult};
use qryvanta_infrastructure::{InMemoryResolutionCache, RedisResolutionCache};
use tracing::warn;

use crate::api_config::{ApiConfig, ResolutionCacheBackend};

pub(super) fn build_resolution_cache(
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> AppResult<Option<Arc<dyn ResolutionCache>>> {
    if config.resolution_cache_ttl_seconds == 0 {
        return Ok(None);
    }

    match config.resolution_cache_backend {
        ResolutionCacheBackend::Disabled => Ok(None),
        ResolutionCacheBackend::InMemory => {
            if config.database_url.is_some() {
                warn!(
                    "in-memory resolution cache is per process; replicas sharing DATABASE_URL \
                     will not see each other's invalidations"
                );
            }
            Ok(Some(Arc::new(InMemoryResolutionCache::new())))
        }
        ResolutionCacheBackend::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation(
                    "REDIS_URL is required when RESOLUTION_CACHE_BACKEND=redis".to_owned(),
                )
            })?;
            Ok(Some(Arc::new(RedisResolutionCache::new(
                redis_client,
                "qryvanta:permission_resolution",
            ))))
        }
    }
}
