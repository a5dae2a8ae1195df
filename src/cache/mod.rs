//! In-memory TTL cache shared by the embedding client and query router.
//!
//! Entries are immutable once written: a key embeds the exact content it
//! was derived from, so concurrent writers racing on the same key always
//! write the same value and no locking discipline is needed beyond what
//! moka provides.

use std::time::{Duration, Instant};

use moka::sync::Cache;
use moka::Expiry;

/// Cached value together with its individual time-to-live.
#[derive(Clone)]
struct Entry<T> {
    value: T,
    ttl: Duration,
}

struct PerEntryExpiry;

impl<T> Expiry<String, Entry<T>> for PerEntryExpiry
where
    T: Clone + Send + Sync + 'static,
{
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry<T>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Keyed TTL cache over opaque hash keys.
///
/// Values carry their own TTL so one cache type serves both 30-day
/// embedding entries and 1-hour routing-table entries.
pub struct TtlCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    cache: Cache<String, Entry<T>>,
}

impl<T> TtlCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new cache bounded to `max_entries`.
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryExpiry)
            .build();

        Self { cache }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<T> {
        self.cache.get(key).map(|entry| entry.value)
    }

    /// Insert a value with its time-to-live.
    pub fn insert(&self, key: String, value: T, ttl: Duration) {
        self.cache.insert(key, Entry { value, ttl });
    }

    /// Number of entries currently in the cache.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invalidate all entries.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

/// Stable content hash for cache keys.
///
/// Identical parts always map to the same key; the schema version is
/// hashed first so a format change invalidates old entries wholesale.
pub fn cache_key(schema_version: u32, parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&schema_version.to_le_bytes());
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(&[0]); // separator, keeps ("ab","c") != ("a","bc")
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let cache: TtlCache<Vec<f32>> = TtlCache::new(100);
        cache.insert("k1".to_string(), vec![1.0, 2.0], Duration::from_secs(60));
        assert_eq!(cache.get("k1"), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn miss_returns_none() {
        let cache: TtlCache<String> = TtlCache::new(100);
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn expired_entry_is_gone() {
        let cache: TtlCache<u32> = TtlCache::new(100);
        cache.insert("k".to_string(), 7, Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn clear_empties_cache() {
        let cache: TtlCache<u32> = TtlCache::new(100);
        cache.insert("a".to_string(), 1, Duration::from_secs(60));
        cache.insert("b".to_string(), 2, Duration::from_secs(60));
        cache.clear();
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn cache_key_is_stable() {
        let a = cache_key(1, &["query", "hello"]);
        let b = cache_key(1, &["query", "hello"]);
        assert_eq!(a, b);
    }

    #[test]
    fn cache_key_separates_parts() {
        let a = cache_key(1, &["ab", "c"]);
        let b = cache_key(1, &["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn cache_key_versioned() {
        let a = cache_key(1, &["text"]);
        let b = cache_key(2, &["text"]);
        assert_ne!(a, b);
    }
}
