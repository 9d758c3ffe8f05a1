//! In-memory result cache for external lookups.
//!
//! Entries are stored as JSON values under an md5 digest of the caller's key,
//! so any serializable lookup result can share one cache. Entries carry their
//! own expiry; expired entries are reported as such and dropped on read, and
//! swept from the whole map every [`PURGE_INTERVAL`] inserts.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Inserts between sweeps of expired entries
pub const PURGE_INTERVAL: u64 = 64;

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    /// Item was found and is valid
    Hit(T),

    /// Item was not found
    Miss,

    /// Item was found but has expired
    Expired,
}

impl<T> CacheResult<T> {
    /// The cached value, if the lookup hit
    pub fn hit(self) -> Option<T> {
        match self {
            CacheResult::Hit(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Statistics about the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// TTL cache keyed by lookup key
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
    hits: std::sync::atomic::AtomicU64,
    misses: std::sync::atomic::AtomicU64,
    inserts: std::sync::atomic::AtomicU64,
}

impl ResultCache {
    /// Create a cache whose entries live for `default_ttl` unless told otherwise
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
            hits: Default::default(),
            misses: Default::default(),
            inserts: Default::default(),
        }
    }

    /// Default entry lifetime
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn cache_key(key: &str) -> String {
        format!("{:x}", md5::compute(key.as_bytes()))
    }

    /// Look up a value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<T> {
        use std::sync::atomic::Ordering;

        let digest = Self::cache_key(key);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let result = match entries.get(&digest) {
            None => CacheResult::Miss,
            Some(entry) if Instant::now() >= entry.expires_at => {
                entries.remove(&digest);
                CacheResult::Expired
            }
            Some(entry) => match serde_json::from_value(entry.value.clone()) {
                Ok(value) => CacheResult::Hit(value),
                Err(e) => {
                    tracing::warn!("Dropping unreadable cache entry for {}: {}", key, e);
                    entries.remove(&digest);
                    CacheResult::Miss
                }
            },
        };

        if matches!(result, CacheResult::Hit(_)) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cache HIT for {}", key);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cache MISS for {}", key);
        }
        result
    }

    /// Store a value with an explicit lifetime
    pub fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Failed to cache result for {}: {}", key, e);
                return;
            }
        };

        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            Self::cache_key(key),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );

        let inserts = self.inserts.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
        if inserts % PURGE_INTERVAL == 0 {
            let before = entries.len();
            entries.retain(|_, entry| entry.expires_at > now);
            tracing::debug!("Purged {} expired cache entries", before - entries.len());
        }
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Clear all cached data
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        use std::sync::atomic::Ordering;

        CacheStats {
            entries: self
                .entries
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_and_miss() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.put("doi:10.1000/x", &"resolved".to_string(), cache.default_ttl());

        assert_eq!(
            cache.get::<String>("doi:10.1000/x"),
            CacheResult::Hit("resolved".to_string())
        );
        assert_eq!(cache.get::<String>("doi:10.1000/y"), CacheResult::Miss);

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expiration() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.put("k", &42u32, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get::<u32>("k"), CacheResult::Hit(42));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get::<u32>("k"), CacheResult::Expired);
        assert_eq!(cache.get::<u32>("k"), CacheResult::Miss);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.put("short", &1u8, Duration::from_secs(1));
        cache.put("long", &2u8, Duration::from_secs(100));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.stats().entries, 1);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inserts_sweep_expired_entries() {
        let cache = ResultCache::new(Duration::from_secs(1));

        for i in 0..1000 {
            cache.put(&format!("doi:10.1000/{}", i), &true, cache.default_ttl());
            tokio::time::advance(Duration::from_secs(2)).await;
        }

        assert!(cache.stats().entries <= PURGE_INTERVAL as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_live_entries() {
        let cache = ResultCache::new(Duration::from_secs(3600));
        for i in 0..(PURGE_INTERVAL * 2) {
            cache.put(&format!("k{}", i), &i, cache.default_ttl());
        }
        assert_eq!(cache.stats().entries, (PURGE_INTERVAL * 2) as usize);
    }
}
