//! In-memory response cache for upstream JSON fetches.
//!
//! Keyed by full request URL. A hit is returned as-is with no revalidation
//! (the "force-cache" mode the fetch layer uses to avoid hammering the
//! upstream service); a fresh fetch write-through replaces any stale entry.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde_json::Value;

/// Hit/miss counters for a [`ResponseCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, Arc<Value>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored response for `url`.
    pub fn get(&self, url: &str) -> Option<Arc<Value>> {
        match self.entries.get(url) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store (or replace) the response for `url`.
    pub fn insert(&self, url: &str, value: Arc<Value>) {
        self.entries.insert(url.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn miss_then_hit() {
        let cache = ResponseCache::new();
        assert!(cache.get("http://example/a.json").is_none());

        cache.insert("http://example/a.json", Arc::new(json!({"ok": true})));
        let hit = cache.get("http://example/a.json").unwrap();
        assert_eq!(hit["ok"], json!(true));

        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn insert_replaces_stale_entry() {
        let cache = ResponseCache::new();
        cache.insert("http://example/a.json", Arc::new(json!({"v": 1})));
        cache.insert("http://example/a.json", Arc::new(json!({"v": 2})));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("http://example/a.json").unwrap()["v"], json!(2));
    }

    #[test]
    fn clear_empties_the_map() {
        let cache = ResponseCache::new();
        cache.insert("http://example/a.json", Arc::new(json!(null)));
        cache.clear();
        assert!(cache.is_empty());
    }
}
