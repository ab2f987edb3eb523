/// Configuration for a token bucket rule.
#[derive(Debug, Clone, Copy)]
pub struct TokenBucketRule {
    /// Maximum number of tokens the bucket can hold.
    pub capacity: u32,
    /// Tokens added per refill period.
    pub refill_tokens: u32,
    /// Refill period, in seconds.
    pub refill_period_seconds: i64,
}

impl TokenBucketRule {
    /// Creates a new token bucket rule.
    #[must_use]
    pub fn new(capacity: u32, refill_tokens: u32, refill_period_seconds: i64) -> Self {
        Self {
            capacity,
            refill_tokens,
            refill_period_seconds,
        }
    }

    /// The platform default: 100 tokens, refilled 100/minute, per §4.7.
    #[must_use]
    pub fn default_credential_limit() -> Self {
        Self::new(100, 100, 60)
    }
}
