use std::time::{Duration, Instant};

use actix_web::web::Bytes;
use dashmap::DashMap;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct CacheEntry {
    pub payload: Bytes,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn new(payload: Bytes, ttl: Duration) -> Self {
        Self {
            payload,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Serialized responses keyed by canonical route path. Expired entries are dropped
/// lazily when they are next looked up.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Some(entry.payload.clone());
            }
        }
        // The read guard is released above; never hold it across this call.
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        None
    }

    pub fn put(&self, key: impl Into<String>, payload: Bytes) {
        self.put_with_ttl(key, payload, self.ttl);
    }

    pub fn put_with_ttl(&self, key: impl Into<String>, payload: Bytes, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry::new(payload, ttl));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_miss_then_hit() {
        let cache = ResponseCache::default();
        assert_eq!(cache.ttl(), Duration::from_secs(60));
        assert!(cache.get("/api/total_wells").is_none());

        cache.put("/api/total_wells", Bytes::from_static(b"{\"total_wells\":7}"));
        assert_eq!(
            cache.get("/api/total_wells"),
            Some(Bytes::from_static(b"{\"total_wells\":7}"))
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = ResponseCache::default();
        cache.put("/api/days_per_era", Bytes::from_static(b"days"));
        cache.put("/api/cost_per_era", Bytes::from_static(b"cost"));

        assert_eq!(cache.get("/api/days_per_era").unwrap(), "days");
        assert_eq!(cache.get("/api/cost_per_era").unwrap(), "cost");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_expired_entry_is_not_served_and_evicted() {
        let cache = ResponseCache::default();
        cache.put_with_ttl("/api/avg_days", Bytes::from_static(b"stale"), Duration::ZERO);
        assert_eq!(cache.len(), 1);

        assert!(cache.get("/api/avg_days").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new(Duration::from_millis(20));
        cache.put("/api/summary_stats", Bytes::from_static(b"first"));
        assert!(cache.get("/api/summary_stats").is_some());

        thread::sleep(Duration::from_millis(40));
        assert!(cache.get("/api/summary_stats").is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let cache = ResponseCache::default();
        cache.put_with_ttl("/api/total_wells", Bytes::from_static(b"old"), Duration::ZERO);
        cache.put("/api/total_wells", Bytes::from_static(b"new"));

        assert_eq!(cache.get("/api/total_wells").unwrap(), "new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(ResponseCache::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..100 {
                        let key = format!("/api/key_{}", j % 10);
                        cache.put(key.clone(), Bytes::from(format!("{i}-{j}")));
                        assert!(cache.get(&key).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 10);
    }
}
