use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use qryvanta_application::{ConsumeOutcome, TokenBucketRule, TokenBucketStore};
use qryvanta_core::AppResult;

struct Bucket {
    tokens: f64,
    last_refill: DateTime<Utc>,
}

/// Process-local token bucket store. Satisfies the "best-effort local
/// limits" option for single-instance deployments.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl InMemoryRateLimitStore {
    /// Creates an empty rate limit store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn refill(bucket: &mut Bucket, rule: TokenBucketRule, now: DateTime<Utc>) {
    let elapsed_seconds = (now - bucket.last_refill).num_milliseconds() as f64 / 1000.0;
    if elapsed_seconds <= 0.0 || rule.refill_period_seconds <= 0 {
        return;
    }

    let refill_rate = f64::from(rule.refill_tokens) / rule.refill_period_seconds as f64;
    let refilled = bucket.tokens + elapsed_seconds * refill_rate;
    bucket.tokens = refilled.min(f64::from(rule.capacity));
    bucket.last_refill = now;
}

#[async_trait]
impl TokenBucketStore for InMemoryRateLimitStore {
    async fn try_consume(&self, key: &str, rule: TokenBucketRule, now: DateTime<Utc>) -> AppResult<ConsumeOutcome> {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key.to_owned()).or_insert_with(|| Bucket {
            tokens: f64::from(rule.capacity),
            last_refill: now,
        });

        refill(bucket, rule, now);

        let allowed = bucket.tokens >= 1.0;
        if allowed {
            bucket.tokens -= 1.0;
        }

        let tokens_remaining = bucket.tokens.floor().max(0.0) as u32;
        let seconds_to_next_token = if rule.refill_tokens == 0 {
            i64::MAX
        } else {
            rule.refill_period_seconds / i64::from(rule.refill_tokens).max(1)
        };
        let retry_after = now + chrono::Duration::seconds(seconds_to_next_token.max(0));

        Ok(ConsumeOutcome {
            allowed,
            tokens_remaining,
            retry_after,
        })
    }
}
