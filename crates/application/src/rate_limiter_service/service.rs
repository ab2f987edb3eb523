use std::sync::Arc;

use chrono::Utc;

use qryvanta_core::{AppError, AppResult};

use super::config::TokenBucketRule;
use super::ports::TokenBucketStore;

/// Application service enforcing a per-credential token bucket at the
/// request boundary. The sole pre-evaluation hard reject per §7.
#[derive(Clone)]
pub struct RateLimiterService {
    store: Arc<dyn TokenBucketStore>,
}

impl RateLimiterService {
    /// Creates a new rate limiter service.
    #[must_use]
    pub fn new(store: Arc<dyn TokenBucketStore>) -> Self {
        Self { store }
    }

    /// Checks whether `credential_key` (an API key or bearer subject) may
    /// proceed under `rule`, consuming one token if so.
    pub async fn check(&self, credential_key: &str, rule: TokenBucketRule) -> AppResult<()> {
        let outcome = self
            .store
            .try_consume(credential_key, rule, Utc::now())
            .await?;

        if !outcome.allowed {
            return Err(AppError::RateLimited {
                retry_after: outcome.retry_after.to_rfc3339(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tokio::sync::Mutex;

    use super::super::ports::ConsumeOutcome;
    use super::*;

    struct FixedBucketStore {
        remaining: Mutex<u32>,
    }

    #[async_trait]
    impl TokenBucketStore for FixedBucketStore {
        async fn try_consume(
            &self,
            _key: &str,
            _rule: TokenBucketRule,
            now: DateTime<Utc>,
        ) -> AppResult<ConsumeOutcome> {
            let mut remaining = self.remaining.lock().await;
            if *remaining == 0 {
                return Ok(ConsumeOutcome {
                    allowed: false,
                    tokens_remaining: 0,
                    retry_after: now,
                });
            }
            *remaining -= 1;
            Ok(ConsumeOutcome {
                allowed: true,
                tokens_remaining: *remaining,
                retry_after: now,
            })
        }
    }

    #[tokio::test]
    async fn fourth_request_in_a_three_capacity_zero_refill_window_is_rejected() {
        let service = RateLimiterService::new(Arc::new(FixedBucketStore {
            remaining: Mutex::new(3),
        }));
        let rule = TokenBucketRule::new(3, 0, 60);

        for _ in 0..3 {
            assert!(service.check("cred-1", rule).await.is_ok());
        }
        let fourth = service.check("cred-1", rule).await;
        assert!(matches!(fourth, Err(AppError::RateLimited { .. })));
    }
}
