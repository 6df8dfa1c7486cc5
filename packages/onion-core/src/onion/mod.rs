//! # Onion Layers
//!
//! Construction and peeling of the nested onion.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          LAYER STRUCTURE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Layer_i = Seal(pub_i, K_i)  ||  AES-GCM(K_i, addr_i || Layer_{i+1})   │
//! │            └─ SEALED_KEY_LEN ─┘  └─ "nonce:ciphertext" ──────────────┘ │
//! │                                                                         │
//! │  addr_i       next hop of relay i (relay i+1, or the recipient)        │
//! │  Layer_{k+1}  the plaintext message                                    │
//! │  K_i          fresh AES-256 key per hop per message                    │
//! │                                                                         │
//! │  Sender builds:   Layer_k, Layer_{k-1}, ... Layer_1   (inside out)     │
//! │  Relay i peels:   Layer_i  →  (addr_i, Layer_{i+1})                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A layer opens with one relay's private key and reveals nothing beyond the
//! next address and the next still-encrypted layer.

mod address;
mod builder;
mod peel;

pub use address::{Address, AddressPlan, ADDRESS_WIDTH};
pub use builder::{build_onion, Hop, Onion};
pub use peel::{peel_layer, unwrap_session_key, PeeledLayer};

use serde::{Deserialize, Serialize};

/// What travels between hops: the opaque blob plus the audit trail.
///
/// `observed_path` is cosmetic. Relays append to it and never read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    /// Onion layer (or plaintext, after the last hop)
    pub blob: String,
    /// Relay ids the message passed through, in order
    #[serde(default)]
    pub observed_path: Vec<u32>,
}

impl WireMessage {
    /// A freshly built onion, not yet seen by any relay
    pub fn new(blob: String) -> Self {
        Self {
            blob,
            observed_path: Vec::new(),
        }
    }
}
