use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use qryvanta_application::{L1Cache, L2Cache, RateLimiterService, TokenBucketStore, TwoTierDecisionCache};
use qryvanta_core::AppError;
use qryvanta_infrastructure::{
    InMemoryDecisionCache, InMemoryRateLimitStore, RedisDecisionCache, RedisRateLimitRepository,
};

use crate::api_config::{ApiConfig, StoreBackend};

/// L1 is always process-local; L2 is optional and chosen by
/// `cache.l2_backend` (§4.4).
pub(super) fn build_decision_cache(
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> Result<TwoTierDecisionCache, AppError> {
    let l1_max_entries = NonZeroUsize::new(config.cache.l1_max_entries)
        .ok_or_else(|| AppError::Validation("CACHE_L1_MAX_ENTRIES must be greater than zero".to_owned()))?;
    let l1: Arc<dyn L1Cache> = Arc::new(InMemoryDecisionCache::new(
        l1_max_entries,
        Duration::from_secs(config.cache.l1_ttl_seconds),
    ));

    let l2: Option<Arc<dyn L2Cache>> = match config.cache.l2_backend {
        StoreBackend::InMemory => None,
        StoreBackend::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation("REDIS_URL is required when CACHE_L2_BACKEND=redis".to_owned())
            })?;
            Some(Arc::new(RedisDecisionCache::new(
                redis_client,
                "qryvanta:decision",
                config.cache.l2_ttl_seconds,
            )))
        }
    };

    Ok(TwoTierDecisionCache::new(l1, l2))
}

pub(super) fn build_rate_limiter_service(
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> Result<RateLimiterService, AppError> {
    let store: Arc<dyn TokenBucketStore> = match config.rate_limit.backend {
        StoreBackend::InMemory => Arc::new(InMemoryRateLimitStore::new()),
        StoreBackend::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation("REDIS_URL is required when RATE_LIMIT_BACKEND=redis".to_owned())
            })?;
            Arc::new(RedisRateLimitRepository::new(redis_client, "qryvanta:rate_limit"))
        }
    };

    Ok(RateLimiterService::new(store))
}
