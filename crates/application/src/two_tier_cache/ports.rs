use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qryvanta_core::AppResult;
use serde::{Deserialize, Serialize};

/// A cached decision, self-describing enough to populate the wire response
/// directly without re-evaluating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedDecision {
    /// `"allow"` or `"deny"` — error decisions MUST NOT be cached (§4.4).
    pub decision: String,
    /// Human-readable reason string.
    pub reason: String,
    /// Roles that contributed to the decision.
    pub contributing_roles: Vec<String>,
    /// Permissions that contributed to the decision.
    pub contributing_permissions: Vec<String>,
    /// When this entry was computed.
    pub created_at: DateTime<Utc>,
}

/// In-process bounded cache: L1 in the two-tier design. Implementations
/// must be internally synchronized for concurrent use and must evict on a
/// bound (entry count) and a TTL after write.
pub trait L1Cache: Send + Sync {
    /// Looks up a cached decision, returning `None` on miss or expiry.
    fn get(&self, key: &str) -> Option<CachedDecision>;

    /// Stores a decision, evicting the least-recently-used entry if the
    /// cache is at capacity.
    fn put(&self, key: String, value: CachedDecision);

    /// Removes exactly the given keys.
    fn invalidate_keys(&self, keys: &[String]);

    /// Removes every key whose fingerprint starts with `prefix`
    /// (organization-wide purge).
    fn invalidate_prefix(&self, prefix: &str);

    /// Current entry count, for metrics and tests.
    fn len(&self) -> usize;

    /// Whether the cache currently holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Distributed cache: L2 in the two-tier design.
#[async_trait]
pub trait L2Cache: Send + Sync {
    /// Looks up a cached decision.
    async fn get(&self, key: &str) -> AppResult<Option<CachedDecision>>;

    /// Stores a decision with the configured TTL.
    async fn put(&self, key: &str, value: &CachedDecision) -> AppResult<()>;

    /// Removes every key with the given tenant prefix. On scan failure,
    /// implementations should fall back to clearing the whole namespace for
    /// the tenant rather than leaving stale entries (§4.4 loss tolerance).
    async fn invalidate_prefix(&self, prefix: &str) -> AppResult<()>;
}
