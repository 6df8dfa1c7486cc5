//! # Onion Core
//!
//! Layered encryption, directory lookup and relaying for a small onion
//! routing overlay.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ONION CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │  Directory  │  │   Sender    │  │    Onion    │  │    Relay     │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - Register  │─►│ - Lookup    │─►│ - Build     │─►│ - Peel       │   │
//! │  │ - List      │  │ - Select    │  │ - Peel      │  │ - Forward    │   │
//! │  │ - Select    │  │ - Send      │  │ - Address   │  │ - Observe    │   │
//! │  └─────────────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │                          │                │                │           │
//! │                          ▼                ▼                ▼           │
//! │                   ┌─────────────┐  ┌─────────────────────────────────┐ │
//! │                   │  Transport  │  │             Crypto              │ │
//! │                   │  (trait)    │  │ - X25519 sealed session keys    │ │
//! │                   └─────────────┘  │ - AES-256-GCM layer bodies      │ │
//! │                                    └─────────────────────────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Key handling, sealed keys and symmetric encryption
//! - [`onion`] - Layer construction, peeling and the address field
//! - [`directory`] - Node registry storage and circuit selection
//! - [`sender`] - Originating messages over a fresh circuit
//! - [`relay`] - Peeling and forwarding at each hop
//! - [`transport`] - The delivery seam between hops
//!
//! ## Security Model
//!
//! Each relay learns only its predecessor (from the connection) and its
//! successor (from its layer). Layers are confidential and integrity
//! protected. There is no sender authentication, no padding and no replay
//! protection; a passive observer of the whole network can correlate
//! traffic by timing and size.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod crypto;
pub mod directory;
pub mod error;
pub mod onion;
pub mod relay;
pub mod sender;
pub mod transport;

#[cfg(test)]
mod testing;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use directory::{DirectoryEntry, MemoryNodeStore, NodeDirectory, NodeList, NodeStore};
pub use error::{Error, Result};
pub use onion::{Address, AddressPlan, WireMessage};
pub use relay::{ForwardingMode, RelayNode, RelayObservations};
pub use sender::{SentMessage, Sender};
pub use transport::Transport;

/// Hops per circuit unless configured otherwise
pub const DEFAULT_CIRCUIT_LENGTH: usize = 3;

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Onion Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
