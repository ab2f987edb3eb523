/// Configuration for the external policy adapter (`policy.engine.*` keys,
/// §6).
#[derive(Debug, Clone)]
pub struct PolicyEngineConfig {
    /// Whether the adapter is consulted at all.
    pub enabled: bool,
    /// Hard request timeout, in milliseconds. Default 5000.
    pub timeout_ms: u64,
    /// Connect timeout, in milliseconds. Default 2000.
    pub connect_timeout_ms: u64,
    /// Retry attempts on transport error. Default 3.
    pub retry_attempts: u32,
    /// Base delay for exponential backoff between retries, in milliseconds.
    pub backoff_base_ms: u64,
}

impl PolicyEngineConfig {
    /// Platform defaults per §4.3: 5 s hard timeout, 2 s connect timeout, 3
    /// retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            timeout_ms: 5_000,
            connect_timeout_ms: 2_000,
            retry_attempts: 3,
            backoff_base_ms: 100,
        }
    }
}
