//! # Cryptography Module
//!
//! The two key services the circuit protocol is built from.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Asymmetric (per relay, lifetime of the process)                       │
//! │  ───────────────────────────────────────────────                        │
//! │  X25519 sealed box:                                                    │
//! │    ephemeral X25519 × relay public → shared secret                    │
//! │    HKDF-SHA256(shared, eph_pub || relay_pub) → AES-256-GCM key         │
//! │    output = eph_pub(32) || nonce(12) || ciphertext+tag                 │
//! │                                                                         │
//! │  Only ever seals the 32-byte per-hop session key.                      │
//! │                                                                         │
//! │  Symmetric (per hop, per message)                                      │
//! │  ────────────────────────────────                                       │
//! │  AES-256-GCM, random 96-bit nonce each call                            │
//! │    wire = base64(nonce) ":" base64(ciphertext+tag)                     │
//! │                                                                         │
//! │  Carries the next-hop address and the inner layer.                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All transportable forms (keys, ciphertexts) are standard padded base64.

pub mod asymmetric;
pub mod symmetric;

pub use asymmetric::{PrivateKey, PublicKey, RelayKeyPair, MAX_SEALED_PLAINTEXT, SEALED_KEY_LEN};
pub use symmetric::{SymmetricKey, NONCE_SIZE};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Size of encryption keys in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Encode bytes as standard base64.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64.
pub fn from_base64(encoded: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded)
}

/// Short, log-safe identifier for an exported key.
///
/// First 8 bytes of SHA-256 over the transportable string, hex encoded.
pub fn fingerprint(exported_key: &str) -> String {
    let digest = Sha256::digest(exported_key.as_bytes());
    hex::encode(&digest[..8])
}
