use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use qryvanta_application::{CachedDecision, L1Cache};

struct Entry {
    value: CachedDecision,
    expires_at: Instant,
}

/// In-process bounded L1 decision cache: an LRU eviction policy over a
/// fixed entry count, plus a short write-through TTL.
pub struct InMemoryDecisionCache {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl InMemoryDecisionCache {
    /// Creates a cache bounded to `max_entries` with the given write TTL.
    #[must_use]
    pub fn new(max_entries: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(max_entries)),
            ttl,
        }
    }
}

impl L1Cache for InMemoryDecisionCache {
    fn get(&self, key: &str) -> Option<CachedDecision> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: String, value: CachedDecision) {
        let expires_at = Instant::now()
            .checked_add(self.ttl)
            .unwrap_or_else(Instant::now);
        self.entries.lock().put(key, Entry { value, expires_at });
    }

    fn invalidate_keys(&self, keys: &[String]) {
        let mut entries = self.entries.lock();
        for key in keys {
            entries.pop(key);
        }
    }

    fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.lock();
        let stale: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            entries.pop(&key);
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
