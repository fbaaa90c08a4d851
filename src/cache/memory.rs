//! In-memory cache implementation
//!
//! TTL and LRU are orthogonal and both required: TTL alone would let an
//! entry nobody re-queries occupy memory until its expiry; LRU alone would
//! let a stale-but-hot entry (say, a branch name that no longer matches
//! reality) survive indefinitely. Expiry is enforced lazily on `get` and
//! periodically by the sweeper; the capacity bound is enforced eagerly on
//! every insert.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub capacity: usize,

    /// Interval between background sweeps
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            sweep_interval: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// A single cache slot. Owned exclusively by the cache; callers only ever
/// receive clones of `value`.
#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
    last_accessed_at: Instant,
}

/// Bounded TTL cache
///
/// Operations are synchronous and non-blocking; the interior mutex is held
/// only across short map manipulations, never across an await point, so the
/// cache can be shared freely between cooperative tasks.
pub struct Cache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    config: CacheConfig,
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
}

impl<V: Clone> Cache<V> {
    /// Create a cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        // A panic mid-operation cannot leave the map structurally broken, so
        // a poisoned lock is still safe to reuse
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` under `key` with the given time-to-live.
    ///
    /// If the cache is full and `key` is not already present, the single
    /// least-recently-used entry is evicted first. Re-setting an existing
    /// key refreshes its expiry in place. Never fails.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let now = Instant::now();
        let mut entries = self.lock();

        if !entries.contains_key(&key) && entries.len() >= self.config.capacity {
            Self::evict_lru(&mut entries);
        }

        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
                last_accessed_at: now,
            },
        );
    }

    /// Look up `key`, returning a clone of the stored value.
    ///
    /// Expired entries are purged on the spot and reported as absent, even
    /// if the sweeper has not visited them yet. A hit refreshes the entry's
    /// last-access time (but never its expiry).
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();

        match entries.get_mut(key) {
            Some(entry) if now > entry.expires_at => {
                entries.remove(key);
                None
            }
            Some(entry) => {
                entry.last_accessed_at = now;
                Some(entry.value.clone())
            }
            None => None,
        }
    }

    /// Remove a single entry. Returns true if it existed.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drop every entry. Called when the trust context changes (a new
    /// credential means previously generated content may belong to a
    /// different identity or quota).
    pub fn clear(&self) {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        tracing::info!(dropped, "Cache cleared");
    }

    /// Number of live entries (expired-but-unswept entries count until
    /// purged)
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.lock().len(),
            capacity: self.config.capacity,
        }
    }

    /// Purge every expired entry, independent of access patterns. Returns
    /// the number of entries removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.expires_at);
        before - entries.len()
    }

    /// Evict the entry with the oldest last-access time. Recency of use, not
    /// remaining freshness, decides the victim.
    fn evict_lru(entries: &mut HashMap<String, Entry<V>>) {
        let victim = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed_at)
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            tracing::debug!(key = %key, "Evicting least-recently-used cache entry");
            entries.remove(&key);
        }
    }
}

impl<V: Clone + Send + 'static> Cache<V> {
    /// Spawn the periodic sweep task.
    ///
    /// The task holds only a weak reference, so dropping the last `Arc`
    /// ends it; aborting the returned handle ends it sooner.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        let sweep_interval = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            // The first tick completes immediately; skip it so sweeps start
            // one full interval after session start
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else { break };
                let purged = cache.sweep();
                if purged > 0 {
                    tracing::debug!(purged, "Cache sweep removed expired entries");
                }
            }
        })
    }
}
