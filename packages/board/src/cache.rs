// ABOUTME: In-process cache for materialized board views
// ABOUTME: Typed keys per bucket and per assignee; invalidated after each commit

use std::collections::HashMap;
use std::sync::RwLock;

use taskboard_storage::Task;
use tracing::debug;

/// Cache key for a materialized view.
///
/// Typed variants instead of concatenated strings, so a bucket id can never
/// collide with a username.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewKey {
    /// Ordered tasks of one bucket
    Bucket(String),
    /// Tasks assigned to one user
    Assignee(String),
}

/// Memoized task views, keyed by [`ViewKey`].
///
/// Mutating operations invalidate strictly after their transaction commits;
/// a missing entry is always recomputed on demand.
#[derive(Default)]
pub struct ViewCache {
    entries: RwLock<HashMap<ViewKey, Vec<Task>>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ViewKey) -> Option<Vec<Task>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn put(&self, key: ViewKey, view: Vec<Task>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, view);
    }

    pub fn invalidate(&self, key: &ViewKey) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.remove(key).is_some() {
            debug!("Invalidated cached view: {:?}", key);
        }
    }

    /// Drop every cached view (assignment touches per-user views globally)
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        debug!("Cleared all cached views");
    }
}
