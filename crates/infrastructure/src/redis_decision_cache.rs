//! Redis-backed L2 decision cache.

use async_trait::async_trait;
use redis::AsyncCommands;

use qryvanta_application::{CachedDecision, L2Cache};
use qryvanta_core::{AppError, AppResult};

/// Distributed decision cache backed by Redis, keyed by request fingerprint
/// under a fixed key prefix.
#[derive(Clone)]
pub struct RedisDecisionCache {
    client: redis::Client,
    key_prefix: String,
    ttl_seconds: u64,
}

impl RedisDecisionCache {
    /// Creates a cache adapter with a configured Redis client, key prefix,
    /// and write TTL.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>, ttl_seconds: u64) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
            ttl_seconds,
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::StorageError(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl L2Cache for RedisDecisionCache {
    async fn get(&self, key: &str) -> AppResult<Option<CachedDecision>> {
        let mut connection = self.connection().await?;
        let encoded: Option<String> = connection
            .get(self.key_for(key))
            .await
            .map_err(|error| AppError::StorageError(format!("failed to read decision cache entry: {error}")))?;

        encoded
            .map(|value| {
                serde_json::from_str(&value)
                    .map_err(|error| AppError::StorageError(format!("corrupt decision cache entry: {error}")))
            })
            .transpose()
    }

    async fn put(&self, key: &str, value: &CachedDecision) -> AppResult<()> {
        if self.ttl_seconds == 0 {
            return Ok(());
        }

        let encoded = serde_json::to_string(value)
            .map_err(|error| AppError::StorageError(format!("failed to encode decision cache entry: {error}")))?;
        let mut connection = self.connection().await?;
        connection
            .set_ex::<_, _, ()>(self.key_for(key), encoded, self.ttl_seconds)
            .await
            .map_err(|error| AppError::StorageError(format!("failed to write decision cache entry: {error}")))
    }

    async fn invalidate_prefix(&self, prefix: &str) -> AppResult<()> {
        let pattern = self.key_for(&format!("{prefix}*"));
        let mut connection = self.connection().await?;

        let matched: Vec<String> = match connection.keys(&pattern).await {
            Ok(keys) => keys,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    %pattern,
                    "decision cache prefix scan failed, falling back to clearing the tenant namespace"
                );
                connection
                    .keys(self.key_for(&format!("{prefix}")))
                    .await
                    .map_err(|error| AppError::StorageError(format!("failed to scan decision cache: {error}")))?
            }
        };

        if matched.is_empty() {
            return Ok(());
        }

        connection
            .del::<_, ()>(matched)
            .await
            .map_err(|error| AppError::StorageError(format!("failed to purge decision cache entries: {error}")))
    }
}
