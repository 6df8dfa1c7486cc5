//! # Directory
//!
//! The node registry the sender draws circuits from.
//!
//! - [`store`]: the `NodeStore` interface and its in-memory implementation
//! - [`selection`]: uniform circuit selection without replacement
//!
//! Entries are not authenticated: whoever registers a `nodeId` last owns it.

pub mod selection;
pub mod store;

pub use selection::{select_circuit, select_circuit_with_rng};
pub use store::{MemoryNodeStore, NodeStore};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One registered relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// Relay id, unique within the directory
    pub node_id: u32,
    /// Exported public key
    pub public_key: String,
}

/// Body of `GET /nodeList`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeList {
    /// Entries sorted by `node_id` ascending
    pub nodes: Vec<DirectoryEntry>,
}

/// Read access to a directory, local or remote.
#[async_trait]
pub trait NodeDirectory: Send + Sync {
    /// Current listing, sorted by `node_id`.
    ///
    /// Implementations report an unreachable directory as
    /// `DirectoryUnavailable`.
    async fn node_list(&self) -> Result<Vec<DirectoryEntry>>;
}

#[async_trait]
impl NodeDirectory for MemoryNodeStore {
    async fn node_list(&self) -> Result<Vec<DirectoryEntry>> {
        Ok(self.list())
    }
}

#[async_trait]
impl<D: NodeDirectory + ?Sized> NodeDirectory for std::sync::Arc<D> {
    async fn node_list(&self) -> Result<Vec<DirectoryEntry>> {
        (**self).node_list().await
    }
}
