use async_trait::async_trait;
use chrono::{DateTime, Utc};

use qryvanta_core::AppResult;

use super::config::TokenBucketRule;

/// Result of attempting to consume one token from a bucket.
#[derive(Debug, Clone, Copy)]
pub struct ConsumeOutcome {
    /// Whether the request is allowed (a token was available).
    pub allowed: bool,
    /// Tokens remaining in the bucket after this attempt.
    pub tokens_remaining: u32,
    /// Instant at which the bucket will next have a token available.
    pub retry_after: DateTime<Utc>,
}

/// Storage port for token buckets, keyed by credential (API key or bearer
/// subject). An in-process implementation satisfies "best-effort local
/// limits"; a distributed-cache-backed implementation satisfies the shared
/// counter option, per §4.7.
#[async_trait]
pub trait TokenBucketStore: Send + Sync {
    /// Attempts to consume a single token from the named bucket, creating it
    /// full if it does not yet exist, and lazily refilling based on elapsed
    /// time since the last attempt.
    async fn try_consume(
        &self,
        key: &str,
        rule: TokenBucketRule,
        now: DateTime<Utc>,
    ) -> AppResult<ConsumeOutcome>;
}
