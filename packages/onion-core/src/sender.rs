//! # Sender
//!
//! The originating side of a circuit: directory lookup, circuit selection,
//! onion construction and hand-off to the first hop.
//!
//! ```text
//!   node_list()          select_circuit()        build_onion()          deliver()
//!  ───────────►  entries ───────────────► hops ────────────────► onion ──────────► hop_1
//!  (Directory)                                  (blocking pool)
//! ```
//!
//! Every failure before `deliver` aborts the send with nothing transmitted.

use serde::{Deserialize, Serialize};

use crate::directory::{select_circuit, NodeDirectory};
use crate::error::{Error, Result};
use crate::onion::{build_onion, AddressPlan, Hop, WireMessage};
use crate::transport::Transport;
use crate::DEFAULT_CIRCUIT_LENGTH;

/// Outcome of a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    /// Relay ids of the circuit, in forwarding order
    pub circuit: Vec<u32>,
}

/// Builds and sends onions.
pub struct Sender<D, T> {
    directory: D,
    transport: T,
    addresses: AddressPlan,
    circuit_length: usize,
}

impl<D, T> Sender<D, T>
where
    D: NodeDirectory,
    T: Transport,
{
    /// Create a sender using the default circuit length
    pub fn new(directory: D, transport: T, addresses: AddressPlan) -> Self {
        Self {
            directory,
            transport,
            addresses,
            circuit_length: DEFAULT_CIRCUIT_LENGTH,
        }
    }

    /// Override the number of hops per circuit
    pub fn with_circuit_length(mut self, circuit_length: usize) -> Self {
        self.circuit_length = circuit_length;
        self
    }

    /// Number of hops per circuit
    pub fn circuit_length(&self) -> usize {
        self.circuit_length
    }

    /// Send `message` to user `destination_id` over a fresh random circuit.
    ///
    /// ## Errors
    ///
    /// - `DirectoryUnavailable` if the listing cannot be fetched
    /// - `InsufficientNodes` if fewer relays than the circuit length exist
    /// - `OnionBuildFailed` if any layer fails to build
    /// - `ForwardingFailed` if the first hop does not accept the onion
    pub async fn send_message(&self, message: &str, destination_id: u32) -> Result<SentMessage> {
        let entries = self.directory.node_list().await?;
        let selected = select_circuit(&entries, self.circuit_length)?;

        let hops = selected
            .into_iter()
            .map(|entry| -> Result<Hop> {
                Ok(Hop {
                    node_id: entry.node_id,
                    address: self.addresses.relay_address(entry.node_id)?,
                    public_key: entry.public_key,
                })
            })
            .collect::<Result<Vec<Hop>>>()
            .map_err(|e| Error::OnionBuildFailed(e.to_string()))?;
        let circuit: Vec<u32> = hops.iter().map(|hop| hop.node_id).collect();
        let destination = self
            .addresses
            .user_address(destination_id)
            .map_err(|e| Error::OnionBuildFailed(e.to_string()))?;

        let message = message.to_string();
        let onion = tokio::task::spawn_blocking(move || build_onion(&message, &hops, destination))
            .await
            .map_err(|e| Error::OnionBuildFailed(format!("Build task failed: {}", e)))??;

        tracing::debug!(circuit = ?circuit, entry = %onion.entry, "Onion built");

        self.transport
            .deliver(onion.entry, WireMessage::new(onion.blob))
            .await
            .map_err(|e| match e {
                Error::ForwardingFailed(_) => e,
                other => Error::ForwardingFailed(other.to_string()),
            })?;

        tracing::info!(circuit = ?circuit, destination_id, "Message sent");
        Ok(SentMessage { circuit })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::crypto::asymmetric::import_private;
    use crate::crypto::symmetric::export_key;
    use crate::directory::{DirectoryEntry, MemoryNodeStore, NodeStore};
    use crate::onion::unwrap_session_key;
    use crate::relay::RelayNode;
    use crate::testing::{LocalNetwork, RecordingTransport};

    const PLAN: AddressPlan = AddressPlan {
        base_relay_port: 4000,
        base_user_port: 3000,
    };

    struct Unreachable;

    #[async_trait]
    impl NodeDirectory for Unreachable {
        async fn node_list(&self) -> Result<Vec<DirectoryEntry>> {
            Err(Error::DirectoryUnavailable("connection refused".into()))
        }
    }

    async fn relays(count: u32, store: &MemoryNodeStore) -> Vec<Arc<RelayNode>> {
        let mut nodes = Vec::new();
        for node_id in 1..=count {
            let node = Arc::new(RelayNode::generate(node_id).await.unwrap());
            store.register(node_id, node.export_public_key());
            nodes.push(node);
        }
        nodes
    }

    #[tokio::test]
    async fn test_message_reaches_recipient_through_circuit() {
        let store = MemoryNodeStore::new();
        let network = LocalNetwork::new();
        for node in relays(5, &store).await {
            network.add_relay(PLAN.relay_address(node.node_id()).unwrap(), node);
        }
        let recipient = PLAN.user_address(7).unwrap();
        network.add_recipient(recipient);

        let sender = Sender::new(store, network.clone(), PLAN);
        let sent = sender.send_message("hello", 7).await.unwrap();

        assert_eq!(sent.circuit.len(), 3);
        assert_eq!(sent.circuit.iter().collect::<HashSet<_>>().len(), 3);

        let inbox = network.inbox(recipient);
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].blob, "hello");
        assert_eq!(inbox[0].observed_path, sent.circuit);
    }

    #[tokio::test]
    async fn test_longer_circuit() {
        let store = MemoryNodeStore::new();
        let network = LocalNetwork::new();
        for node in relays(6, &store).await {
            network.add_relay(PLAN.relay_address(node.node_id()).unwrap(), node);
        }
        network.add_recipient(PLAN.user_address(1).unwrap());

        let sender = Sender::new(store, network.clone(), PLAN).with_circuit_length(6);
        let sent = sender.send_message("six hops", 1).await.unwrap();

        assert_eq!(sender.circuit_length(), 6);
        assert_eq!(network.inbox(PLAN.user_address(1).unwrap())[0].observed_path, sent.circuit);
    }

    #[tokio::test]
    async fn test_session_keys_fresh_per_message() {
        let store = MemoryNodeStore::new();
        let nodes = relays(3, &store).await;
        let transport = Arc::new(RecordingTransport::new());
        let sender = Sender::new(store, transport.clone(), PLAN);

        let mut session_keys = Vec::new();
        for _ in 0..2 {
            sender.send_message("same text", 2).await.unwrap();
            let (entry, message) = transport.next_delivery().await;
            let node = nodes
                .iter()
                .find(|n| PLAN.relay_address(n.node_id()).unwrap() == entry)
                .unwrap();
            let private = import_private(&node.export_private_key().unwrap()).unwrap();
            let (key, _) = unwrap_session_key(&message.blob, &private).unwrap();
            session_keys.push(export_key(&key));
        }

        assert_ne!(session_keys[0], session_keys[1]);
    }

    #[tokio::test]
    async fn test_insufficient_nodes_sends_nothing() {
        let store = MemoryNodeStore::new();
        relays(2, &store).await;
        let transport = Arc::new(RecordingTransport::new());
        let sender = Sender::new(store, transport.clone(), PLAN);

        let result = sender.send_message("hello", 1).await;

        assert_eq!(
            result,
            Err(Error::InsufficientNodes {
                required: 3,
                available: 2
            })
        );
        assert_eq!(transport.delivered(), 0);
    }

    #[test]
    fn test_unreachable_directory() {
        let transport = Arc::new(RecordingTransport::new());
        let sender = Sender::new(Unreachable, transport.clone(), PLAN);

        let result = tokio_test::block_on(sender.send_message("hello", 1));

        assert!(matches!(result, Err(Error::DirectoryUnavailable(_))));
        assert_eq!(transport.delivered(), 0);
    }

    #[tokio::test]
    async fn test_first_hop_refusal_is_forwarding_failure() {
        let store = MemoryNodeStore::new();
        relays(3, &store).await;
        let sender = Sender::new(store, Arc::new(RecordingTransport::failing()), PLAN);

        let result = sender.send_message("hello", 1).await;
        assert!(matches!(result, Err(Error::ForwardingFailed(_))));
    }

    #[tokio::test]
    async fn test_unknown_recipient_fails_back_along_circuit() {
        let store = MemoryNodeStore::new();
        let network = LocalNetwork::new();
        for node in relays(3, &store).await {
            network.add_relay(PLAN.relay_address(node.node_id()).unwrap(), node);
        }

        let sender = Sender::new(store, network, PLAN);
        let result = sender.send_message("hello", 99).await;

        assert!(matches!(result, Err(Error::ForwardingFailed(_))));
    }

    #[tokio::test]
    async fn test_destination_outside_address_range_sends_nothing() {
        let store = MemoryNodeStore::new();
        relays(3, &store).await;
        let transport = Arc::new(RecordingTransport::new());
        let sender = Sender::new(store, transport.clone(), PLAN);

        let result = sender.send_message("hi", u32::MAX).await;

        assert!(matches!(result, Err(Error::OnionBuildFailed(_))));
        assert_eq!(transport.delivered(), 0);
    }

    #[tokio::test]
    async fn test_relay_outside_address_range_sends_nothing() {
        let store = MemoryNodeStore::new();
        for node_id in [1, 2, u32::MAX] {
            let node = RelayNode::generate(node_id).await.unwrap();
            store.register(node_id, node.export_public_key());
        }
        let transport = Arc::new(RecordingTransport::new());
        let sender = Sender::new(store, transport.clone(), PLAN);

        let result = sender.send_message("hi", 1).await;

        assert!(matches!(result, Err(Error::OnionBuildFailed(_))));
        assert_eq!(transport.delivered(), 0);
    }
}
