//! # Error Handling
//!
//! Error types shared by every onion-core component.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── InvalidKey            - Key missing or not importable         │
//! │  │   ├── EncryptionFailed      - Payload too large / cipher error      │
//! │  │   └── DecryptionFailed      - Wrong key, corrupted or malformed     │
//! │  │                                                                      │
//! │  ├── Relay Errors                                                      │
//! │  │   ├── KeyUnwrapFailed       - Layer not sealed for this relay       │
//! │  │   ├── PayloadDecryptFailed  - Layer body does not decrypt           │
//! │  │   └── InvalidAddress        - Next-hop prefix missing or garbled    │
//! │  │                                                                      │
//! │  ├── Sender Errors                                                     │
//! │  │   ├── InsufficientNodes     - Directory smaller than the circuit    │
//! │  │   ├── DirectoryUnavailable  - Listing could not be fetched          │
//! │  │   └── OnionBuildFailed      - A layer could not be built            │
//! │  │                                                                      │
//! │  ├── Transport Errors                                                  │
//! │  │   └── ForwardingFailed      - Next hop did not accept the message   │
//! │  │                                                                      │
//! │  └── Internal                                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Relay and sender errors are terminal for the message they concern: there
//! is no retry and no path repair.

use thiserror::Error;

/// Result type alias for onion-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for onion-core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================

    /// Key missing, malformed or of the wrong length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Encryption failed (including oversize asymmetric payloads)
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (wrong key, tampering, malformed wire format)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    // ========================================================================
    // Relay Errors (400-499)
    // ========================================================================

    /// The wrapped session key could not be opened with this relay's key
    #[error("Failed to unwrap session key: {0}")]
    KeyUnwrapFailed(String),

    /// The layer body did not decrypt under the unwrapped session key
    #[error("Failed to decrypt layer payload: {0}")]
    PayloadDecryptFailed(String),

    /// The decrypted layer does not start with a valid next-hop address
    #[error("Invalid next-hop address: {0}")]
    InvalidAddress(String),

    // ========================================================================
    // Sender Errors (500-599)
    // ========================================================================

    /// Not enough relays registered to build a circuit
    #[error("Not enough nodes available: need {required}, directory has {available}")]
    InsufficientNodes {
        /// Circuit length requested
        required: usize,
        /// Entries in the directory listing
        available: usize,
    },

    /// The directory could not be queried
    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// Building one of the layers failed; nothing was sent
    #[error("Failed to build onion: {0}")]
    OnionBuildFailed(String),

    // ========================================================================
    // Transport Errors (600-699)
    // ========================================================================

    /// The next hop could not be reached or rejected the message
    #[error("Failed to forward message: {0}")]
    ForwardingFailed(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Numeric error code, grouped by category:
    /// - 300-399: Crypto
    /// - 400-499: Relay
    /// - 500-599: Sender
    /// - 600-699: Transport
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidKey(_) => 300,
            Error::EncryptionFailed(_) => 301,
            Error::DecryptionFailed(_) => 302,

            Error::KeyUnwrapFailed(_) => 400,
            Error::PayloadDecryptFailed(_) => 401,
            Error::InvalidAddress(_) => 402,

            Error::InsufficientNodes { .. } => 500,
            Error::DirectoryUnavailable(_) => 501,
            Error::OnionBuildFailed(_) => 502,

            Error::ForwardingFailed(_) => 600,

            Error::Internal(_) => 900,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors may go away if the caller sends again later
    /// (more relays registered, directory back up, next hop restarted).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InsufficientNodes { .. }
                | Error::DirectoryUnavailable(_)
                | Error::ForwardingFailed(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("Crypto task failed: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("Serialization error: {}", err))
    }
}

// ============================================================================
// TESTS
// ============================================================================
