//! Explicit query-result cache
//!
//! Results of the list operations are cached per process, keyed by
//! operation name plus canonical arguments. Writers invalidate the keys
//! they make stale, so a caller observes their own write on the next read.

use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local cache of query results
pub struct QueryCache<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn put(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.into(), value);
    }

    pub fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.remove(key).is_some() {
            tracing::debug!(key = %key, "Invalidated cached query");
        }
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache key helpers, one per cached operation
pub mod keys {
    pub const GET_ALL: &str = "posts.getAll";

    pub fn posts_by_user(user_id: &str) -> String {
        format!("posts.getPostsByUserId?userId={}", user_id)
    }
}
