use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Cache entry categories with independent freshness windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCategory {
    Prices,
    Fundamentals,
    Screening,
}

impl CacheCategory {
    pub fn ttl(&self) -> Duration {
        match self {
            CacheCategory::Prices => Duration::hours(1),
            CacheCategory::Fundamentals => Duration::hours(24),
            CacheCategory::Screening => Duration::minutes(30),
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            CacheCategory::Prices => "prices",
            CacheCategory::Fundamentals => "fundamentals",
            CacheCategory::Screening => "screening",
        }
    }
}

/// Internal cache entry with timestamp
struct CacheEntry {
    value: serde_json::Value,
    cached_at: DateTime<Utc>,
}

/// In-process TTL cache. Constructed by the caller and handed to whatever
/// wants a read-through; there is no process-wide instance. Entries are
/// written whole, so a reader never observes a partial value.
#[derive(Default)]
pub struct ScreenerCache {
    entries: DashMap<String, CacheEntry>,
}

impl ScreenerCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Fetch and deserialize an entry younger than `ttl`. Expired entries
    /// are evicted on the way out.
    pub fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if Utc::now() - entry.cached_at < ttl {
                    return serde_json::from_value(entry.value.clone()).ok();
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Store a value under `key`, replacing any previous entry
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.insert(
                    key.to_string(),
                    CacheEntry {
                        value,
                        cached_at: Utc::now(),
                    },
                );
                true
            }
            Err(e) => {
                tracing::warn!("Failed to serialize cache entry {}: {}", key, e);
                false
            }
        }
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
        }
    }
}

/// Point-in-time cache occupancy
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub entries: usize,
}

/// Deterministic cache key from a prefix and parameter set. Parameters are
/// sorted before hashing so call-site ordering cannot fragment the cache.
pub fn cache_key(prefix: &str, params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    for (name, value) in sorted {
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b";");
    }
    let digest = hex::encode(hasher.finalize());
    format!("{}_{}", prefix, &digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_round_trip() {
        let cache = ScreenerCache::new();
        assert!(cache.set("screening_abc", &vec![1.0, 2.0, 3.0]));
        let value: Vec<f64> = cache.get("screening_abc", Duration::hours(1)).unwrap();
        assert_eq!(value, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_missing_key_is_none() {
        let cache = ScreenerCache::new();
        let value: Option<String> = cache.get("nope", Duration::hours(1));
        assert!(value.is_none());
    }

    #[test]
    fn test_expired_entry_evicted() {
        let cache = ScreenerCache::new();
        cache.set("stale", &42u32);
        // Zero TTL: the entry is already too old by definition
        let value: Option<u32> = cache.get("stale", Duration::zero());
        assert!(value.is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache = ScreenerCache::new();
        cache.set("key", &1u32);
        assert!(cache.invalidate("key"));
        assert!(!cache.invalidate("key"));
        let value: Option<u32> = cache.get("key", Duration::hours(1));
        assert!(value.is_none());
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = ScreenerCache::new();
        cache.set("a", &1u32);
        cache.set("b", &2u32);
        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_cache_key_ignores_param_order() {
        let a = cache_key(
            "screening",
            &[("sector", "IT".to_string()), ("rs_threshold", "80".to_string())],
        );
        let b = cache_key(
            "screening",
            &[("rs_threshold", "80".to_string()), ("sector", "IT".to_string())],
        );
        assert_eq!(a, b);
        assert!(a.starts_with("screening_"));
    }

    #[test]
    fn test_cache_key_differs_on_params() {
        let a = cache_key("screening", &[("rs_threshold", "80".to_string())]);
        let b = cache_key("screening", &[("rs_threshold", "85".to_string())]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_category_ttls() {
        assert_eq!(CacheCategory::Prices.ttl(), Duration::hours(1));
        assert_eq!(CacheCategory::Fundamentals.ttl(), Duration::hours(24));
        assert_eq!(CacheCategory::Screening.ttl(), Duration::minutes(30));
    }
}
