//! # Relay
//!
//! A relay peels one layer of every message it receives and forwards the
//! remainder to the address that falls out of decryption.
//!
//! ## Peeling Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  inbound { blob, observedPath }                                        │
//! │     │                                                                   │
//! │     ├─ 1. split blob at SEALED_KEY_LEN                                 │
//! │     ├─ 2. open session key with own private key   → KeyUnwrapFailed    │
//! │     ├─ 3. decrypt the body                         → PayloadDecrypt…   │
//! │     ├─ 4. slice the 10-char next address           → InvalidAddress    │
//! │     ├─ 5. observedPath += own id                                       │
//! │     └─ 6. record observations                                          │
//! │                                                                         │
//! │  outbound { remainder, observedPath } → next address                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Relays hold no per-circuit state. A relay cannot tell whether it is the
//! last hop; it forwards whatever the layer says.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::crypto::asymmetric::{self, RelayKeyPair};
use crate::crypto::fingerprint;
use crate::error::{Error, Result};
use crate::onion::{peel_layer, Address, WireMessage};
use crate::transport::Transport;

/// When a relay acknowledges its caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardingMode {
    /// Acknowledge once peeled; forward in the background and only log
    /// failures.
    #[default]
    Detached,
    /// Acknowledge only after the next hop accepted the message, so
    /// failures travel back along the circuit.
    Acknowledged,
}

impl FromStr for ForwardingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "detached" => Ok(Self::Detached),
            "acknowledged" => Ok(Self::Acknowledged),
            other => Err(format!(
                "unknown forwarding mode '{}' (expected 'detached' or 'acknowledged')",
                other
            )),
        }
    }
}

impl fmt::Display for ForwardingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached => f.write_str("detached"),
            Self::Acknowledged => f.write_str("acknowledged"),
        }
    }
}

/// The outcome of peeling: what to send and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forward {
    /// Next hop
    pub to: Address,
    /// Remainder with the extended observed path
    pub message: WireMessage,
}

/// Diagnostic record of the most recent message. Last writer wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayObservations {
    /// Blob as received
    pub last_encrypted: Option<String>,
    /// Remainder after peeling
    pub last_decrypted: Option<String>,
    /// Where the remainder was sent
    pub last_destination: Option<Address>,
    /// Observed path after appending this relay
    pub last_observed_path: Option<Vec<u32>>,
}

/// A relay node's identity, keys and diagnostics.
pub struct RelayNode {
    node_id: u32,
    keys: RelayKeyPair,
    observations: RwLock<RelayObservations>,
}

impl RelayNode {
    /// Create a relay around an existing keypair
    pub fn new(node_id: u32, keys: RelayKeyPair) -> Self {
        Self {
            node_id,
            keys,
            observations: RwLock::new(RelayObservations::default()),
        }
    }

    /// Create a relay with a freshly generated keypair.
    ///
    /// Key generation runs on the blocking pool.
    pub async fn generate(node_id: u32) -> Result<Self> {
        let keys = tokio::task::spawn_blocking(asymmetric::generate_key_pair).await?;
        tracing::debug!(
            node_id,
            key = %fingerprint(&keys.export_public()),
            "Relay keypair generated"
        );
        Ok(Self::new(node_id, keys))
    }

    /// Directory id
    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    /// Exported public key, as registered with the directory
    pub fn export_public_key(&self) -> String {
        self.keys.export_public()
    }

    /// Exported private key, for the introspection endpoint only
    pub fn export_private_key(&self) -> Result<String> {
        asymmetric::export_private(Some(self.keys.private_key()))
    }

    /// Snapshot of the last-message diagnostics
    pub fn observations(&self) -> RelayObservations {
        self.observations.read().clone()
    }

    /// Peel one layer and work out where the remainder goes.
    pub fn peel(&self, message: WireMessage) -> Result<Forward> {
        let WireMessage {
            blob,
            mut observed_path,
        } = message;

        self.observations.write().last_encrypted = Some(blob.clone());

        let peeled = peel_layer(&blob, self.keys.private_key()).map_err(|e| {
            tracing::warn!(node_id = self.node_id, error = %e, "Failed to peel layer");
            e
        })?;

        observed_path.push(self.node_id);

        {
            let mut observations = self.observations.write();
            observations.last_decrypted = Some(peeled.payload.clone());
            observations.last_destination = Some(peeled.next);
            observations.last_observed_path = Some(observed_path.clone());
        }

        Ok(Forward {
            to: peeled.next,
            message: WireMessage {
                blob: peeled.payload,
                observed_path,
            },
        })
    }

    /// [`peel`](Self::peel) on the blocking pool.
    pub async fn on_message(self: &Arc<Self>, message: WireMessage) -> Result<Forward> {
        let node = Arc::clone(self);
        tokio::task::spawn_blocking(move || node.peel(message)).await?
    }

    /// Peel `message` and forward the remainder through `transport`.
    ///
    /// Peeling errors are always returned. Forwarding errors are returned in
    /// `Acknowledged` mode and only logged in `Detached` mode.
    pub async fn relay<T>(
        self: &Arc<Self>,
        message: WireMessage,
        transport: Arc<T>,
        mode: ForwardingMode,
    ) -> Result<()>
    where
        T: Transport + ?Sized + 'static,
    {
        let Forward { to, message } = self.on_message(message).await?;
        let node_id = self.node_id;

        tracing::debug!(node_id, next = %to, mode = %mode, "Forwarding peeled message");

        match mode {
            ForwardingMode::Detached => {
                tokio::spawn(async move {
                    if let Err(e) = transport.deliver(to, message).await {
                        tracing::warn!(node_id, next = %to, error = %e, "Forwarding failed");
                    }
                });
                Ok(())
            }
            ForwardingMode::Acknowledged => {
                transport.deliver(to, message).await.map_err(|e| {
                    tracing::warn!(node_id, next = %to, error = %e, "Forwarding failed");
                    match e {
                        Error::ForwardingFailed(_) => e,
                        other => Error::ForwardingFailed(other.to_string()),
                    }
                })
            }
        }
    }
}
