//! Directory storage.
//!
//! The registry only ever needs two operations, so the backing store sits
//! behind [`NodeStore`]. The in-memory store keeps entries in a `BTreeMap`,
//! which hands out listings already sorted by node id.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::DirectoryEntry;

/// Backing store for the directory.
pub trait NodeStore: Send + Sync {
    /// Insert or overwrite the entry for `node_id` (last write wins).
    fn register(&self, node_id: u32, public_key: String);

    /// All entries, sorted by `node_id` ascending.
    fn list(&self) -> Vec<DirectoryEntry>;
}

/// Process-lifetime in-memory store.
#[derive(Clone, Default)]
pub struct MemoryNodeStore {
    nodes: Arc<RwLock<BTreeMap<u32, String>>>,
}

impl MemoryNodeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether no node has registered yet
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

impl NodeStore for MemoryNodeStore {
    fn register(&self, node_id: u32, public_key: String) {
        let replaced = self.nodes.write().insert(node_id, public_key).is_some();
        tracing::debug!(node_id, replaced, "Node registered");
    }

    fn list(&self) -> Vec<DirectoryEntry> {
        self.nodes
            .read()
            .iter()
            .map(|(node_id, public_key)| DirectoryEntry {
                node_id: *node_id,
                public_key: public_key.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_is_sorted() {
        let store = MemoryNodeStore::new();
        for id in [5, 1, 4, 2, 3] {
            store.register(id, format!("key-{}", id));
        }

        let ids: Vec<u32> = store.list().iter().map(|e| e.node_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let store = MemoryNodeStore::new();
        store.register(1, "old".into());
        store.register(1, "new".into());

        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].public_key, "new");
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryNodeStore::new();
        let clone = store.clone();
        clone.register(9, "k".into());

        assert!(!store.is_empty());
        assert_eq!(store.list()[0].node_id, 9);
    }
}
