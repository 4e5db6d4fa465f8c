//! Report cache collaborator

use crate::report::Report;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Normalize input text into its cache key: trimmed, lower-cased.
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Cache of analysis reports keyed by normalized input text.
///
/// Persistence scope and eviction are the implementation's concern; the
/// coordinator only reads before issuing a request and writes on success.
pub trait ReportCache: Send + Sync {
    /// Look up a report by normalized key
    fn get(&self, key: &str) -> Option<Report>;
    /// Store a report under a normalized key
    fn set(&self, key: &str, report: Report);
}

/// Session-scoped in-memory cache
#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<Mutex<HashMap<String, Report>>>,
}

impl InMemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached reports
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ReportCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Report> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, report: Report) {
        self.entries.lock().insert(key.to_string(), report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report {
            originality: 0.9,
            matches: vec![],
            word_count: 42,
            completed_at: None,
        }
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Hello World  "), "hello world");
        assert_eq!(normalize_key("hello world"), "hello world");
        assert_eq!(normalize_key("   "), "");
    }

    #[test]
    fn test_set_get() {
        let cache = InMemoryCache::new();
        assert!(cache.get("hello world").is_none());

        cache.set("hello world", report());
        assert_eq!(cache.get("hello world").unwrap().word_count, 42);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = InMemoryCache::new();
        let clone = cache.clone();
        cache.set("key", report());
        assert!(clone.get("key").is_some());
    }
}
