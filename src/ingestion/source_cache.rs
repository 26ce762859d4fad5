//! Bounded cache of fetched source bytes
//!
//! Owned by the ingestion component and invalidated deliberately once a
//! source artifact is deleted.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

struct CacheEntry {
    data: Bytes,
    cached_at: DateTime<Utc>,
}

/// Capacity-limited source-bytes cache with oldest-entry eviction
pub struct SourceCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl SourceCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Cached bytes for a source ref, if present
    pub fn get(&self, source_ref: &str) -> Option<Bytes> {
        self.entries.read().get(source_ref).map(|e| e.data.clone())
    }

    /// Cache the bytes for a source ref, evicting the oldest entry at
    /// capacity
    pub fn put(&self, source_ref: &str, data: Bytes) {
        let mut entries = self.entries.write();
        if !entries.contains_key(source_ref) && entries.len() >= self.max_entries {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.cached_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            source_ref.to_string(),
            CacheEntry {
                data,
                cached_at: Utc::now(),
            },
        );
    }

    /// Drop a source ref from the cache
    pub fn invalidate(&self, source_ref: &str) {
        self.entries.write().remove(source_ref);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let cache = SourceCache::new(2);
        cache.put("a.csv", Bytes::from_static(b"a"));
        std::thread::sleep(std::time::Duration::from_millis(2));
        cache.put("b.csv", Bytes::from_static(b"b"));
        std::thread::sleep(std::time::Duration::from_millis(2));
        cache.put("c.csv", Bytes::from_static(b"c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a.csv").is_none());
        assert!(cache.get("b.csv").is_some());
        assert!(cache.get("c.csv").is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = SourceCache::new(2);
        cache.put("a.csv", Bytes::from_static(b"a"));
        cache.put("b.csv", Bytes::from_static(b"b"));
        cache.put("b.csv", Bytes::from_static(b"b2"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b.csv").unwrap(), Bytes::from_static(b"b2"));
        assert!(cache.get("a.csv").is_some());
    }

    #[test]
    fn test_invalidate() {
        let cache = SourceCache::new(4);
        cache.put("a.csv", Bytes::from_static(b"a"));
        cache.invalidate("a.csv");
        assert!(cache.get("a.csv").is_none());
        assert!(cache.is_empty());
    }
}
