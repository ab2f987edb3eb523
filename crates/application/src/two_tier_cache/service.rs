use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::fingerprint::tenant_prefix;
use super::ports::{CachedDecision, L1Cache, L2Cache};
use crate::mutation_event_bus::{MutationEvent, MutationEventSubscriber};

/// Hit/miss counters for the two-tier cache, surfaced as
/// `authz.cache.hits`/`authz.cache.misses` (§6).
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    /// Returns the accumulated hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the accumulated miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// The two-tier decision cache: an in-process L1 plus an optional
/// distributed L2. L2 is optional so a single-instance deployment can run
/// with L1 alone, degrading gracefully rather than requiring Redis.
#[derive(Clone)]
pub struct TwoTierDecisionCache {
    l1: Arc<dyn L1Cache>,
    l2: Option<Arc<dyn L2Cache>>,
    stats: Arc<CacheStats>,
}

impl TwoTierDecisionCache {
    /// Creates a new two-tier cache.
    #[must_use]
    pub fn new(l1: Arc<dyn L1Cache>, l2: Option<Arc<dyn L2Cache>>) -> Self {
        Self {
            l1,
            l2,
            stats: Arc::new(CacheStats::default()),
        }
    }

    /// Returns the hit/miss counters.
    #[must_use]
    pub fn stats(&self) -> Arc<CacheStats> {
        self.stats.clone()
    }

    /// Reads the cache per §4.4's protocol: L1 hit returns immediately; L1
    /// miss checks L2 and promotes on hit; total miss returns `None` so the
    /// caller can evaluate and call [`TwoTierDecisionCache::populate`].
    pub async fn get(&self, key: &str) -> Option<CachedDecision> {
        if let Some(hit) = self.l1.get(key) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Some(hit);
        }

        if let Some(l2) = &self.l2 {
            match l2.get(key).await {
                Ok(Some(hit)) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    self.l1.put(key.to_owned(), hit.clone());
                    return Some(hit);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, "L2 cache read failed, serving L1-only");
                }
            }
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Populates both layers with a successful decision. Error decisions
    /// must never reach this method (§4.4 — "null/error decisions MUST NOT
    /// be cached").
    pub async fn populate(&self, key: &str, value: CachedDecision) {
        debug_assert!(
            value.decision == "allow" || value.decision == "deny",
            "only allow/deny decisions may be cached"
        );

        self.l1.put(key.to_owned(), value.clone());
        if let Some(l2) = &self.l2 {
            if let Err(error) = l2.put(key, &value).await {
                warn!(%error, "L2 cache write failed, decision remains L1-only");
            }
        }
    }

    /// Invalidates exactly the given keys in L1, and issues a prefix purge
    /// in L2 scoped to those keys' shared tenant prefix when the caller
    /// knows it covers the same scope (role/user-role events, §4.4).
    pub async fn invalidate_keys(&self, keys: &[String]) {
        self.l1.invalidate_keys(keys);
    }

    /// Invalidates every key under `prefix` in both layers
    /// (organization-wide purge for role-permission/policy/hierarchy
    /// events).
    pub async fn invalidate_prefix(&self, prefix: &str) {
        self.l1.invalidate_prefix(prefix);
        if let Some(l2) = &self.l2 {
            if let Err(error) = l2.invalidate_prefix(prefix).await {
                warn!(%error, prefix, "L2 prefix purge failed");
            }
        }
    }
}

/// Wires mutation events straight to cache invalidation (§4.4, §4.8).
/// Role-permission, policy, and role-hierarchy changes can alter any
/// principal's outcome under the tenant, so they purge the whole tenant
/// prefix; user-scoped events purge only that principal's prefix.
#[async_trait]
impl MutationEventSubscriber for TwoTierDecisionCache {
    async fn handle(&self, event: MutationEvent) {
        match event {
            MutationEvent::UserRoleChanged { tenant_id, principal }
            | MutationEvent::UserChanged { tenant_id, principal } => {
                self.invalidate_prefix(&format!("{}{principal}:", tenant_prefix(tenant_id))).await;
            }
            MutationEvent::RolePermissionChanged { tenant_id }
            | MutationEvent::PolicyChanged { tenant_id }
            | MutationEvent::RoleHierarchyChanged { tenant_id } => {
                self.invalidate_prefix(&tenant_prefix(tenant_id)).await;
            }
        }
    }
}
