//! Redis-backed token bucket store, for rate limiting shared across
//! instances.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::Script;

use qryvanta_application::{ConsumeOutcome, TokenBucketRule, TokenBucketStore};
use qryvanta_core::{AppError, AppResult};

// Lazily refills a bucket based on elapsed time since the last attempt, then
// tries to consume one token. Keeps the bucket state (tokens, last refill
// epoch) in a single hash so the read-refill-consume sequence is atomic.
const TRY_CONSUME_SCRIPT: &str = r#"
local key = KEYS[1]
local capacity = tonumber(ARGV[1])
local refill_tokens = tonumber(ARGV[2])
local refill_period = tonumber(ARGV[3])
local now_epoch = tonumber(ARGV[4])

local state = redis.call('HMGET', key, 'tokens', 'last_refill')
local tokens = tonumber(state[1])
local last_refill = tonumber(state[2])

if tokens == nil then
  tokens = capacity
  last_refill = now_epoch
end

local elapsed = now_epoch - last_refill
if elapsed > 0 and refill_period > 0 then
  local refill_rate = refill_tokens / refill_period
  tokens = math.min(capacity, tokens + elapsed * refill_rate)
  last_refill = now_epoch
end

local allowed = 0
if tokens >= 1 then
  allowed = 1
  tokens = tokens - 1
end

redis.call('HSET', key, 'tokens', tokens, 'last_refill', last_refill)
redis.call('EXPIRE', key, refill_period * 2)

return {allowed, tokens}
"#;

/// Redis implementation of the token bucket store port, for multi-instance
/// deployments sharing a rate limit counter.
#[derive(Clone)]
pub struct RedisRateLimitRepository {
    client: redis::Client,
    key_prefix: String,
}

impl RedisRateLimitRepository {
    /// Creates a repository with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }
}

#[async_trait]
impl TokenBucketStore for RedisRateLimitRepository {
    async fn try_consume(&self, key: &str, rule: TokenBucketRule, now: DateTime<Utc>) -> AppResult<ConsumeOutcome> {
        let redis_key = self.key_for(key);
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::StorageError(format!("failed to connect to redis: {error}")))?;

        let script = Script::new(TRY_CONSUME_SCRIPT);
        let (allowed, tokens_remaining): (i64, f64) = script
            .key(redis_key)
            .arg(rule.capacity)
            .arg(rule.refill_tokens)
            .arg(rule.refill_period_seconds.max(1))
            .arg(now.timestamp())
            .invoke_async(&mut connection)
            .await
            .map_err(|error| AppError::StorageError(format!("failed to consume rate limit token: {error}")))?;

        let seconds_to_next_token = if rule.refill_tokens == 0 {
            i64::MAX
        } else {
            rule.refill_period_seconds / i64::from(rule.refill_tokens).max(1)
        };

        Ok(ConsumeOutcome {
            allowed: allowed == 1,
            tokens_remaining: tokens_remaining.floor().max(0.0) as u32,
            retry_after: now + chrono::Duration::seconds(seconds_to_next_token.max(0)),
        })
    }
}
