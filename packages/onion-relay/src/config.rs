//! Network configuration.
//!
//! One `NetworkConfig` describes a whole local overlay: where the directory
//! listens, how many relays and users to start and how they forward.

use onion_core::{Address, AddressPlan, ForwardingMode, DEFAULT_CIRCUIT_LENGTH};

/// Default number of relays started by the launcher.
const DEFAULT_RELAYS: u32 = 10;

/// Default number of users started by the launcher.
const DEFAULT_USERS: u32 = 2;

/// Default directory port.
const DEFAULT_REGISTRY_PORT: u16 = 8080;

/// Layout and behaviour of a local overlay.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Interface every server binds to and every client dials
    pub host: String,
    /// Port the directory listens on
    pub registry_port: u16,
    /// Relays get ids `1..=relays`
    pub relays: u32,
    /// Users get ids `1..=users`
    pub users: u32,
    /// Maps relay and user ids to listening ports
    pub addresses: AddressPlan,
    /// Hops per circuit, used by every user's sender
    pub circuit_length: usize,
    /// Whether relays answer before or after the next hop accepts
    pub forwarding: ForwardingMode,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            registry_port: DEFAULT_REGISTRY_PORT,
            relays: DEFAULT_RELAYS,
            users: DEFAULT_USERS,
            addresses: AddressPlan::default(),
            circuit_length: DEFAULT_CIRCUIT_LENGTH,
            forwarding: ForwardingMode::default(),
        }
    }
}

impl NetworkConfig {
    /// Base URL of the directory
    pub fn registry_url(&self) -> String {
        format!("http://{}:{}", self.host, self.registry_port)
    }

    /// Base URL of whatever listens at `address`
    pub fn url_for(&self, address: Address) -> String {
        format!("http://{}:{}", self.host, address)
    }

    /// `host:port` for binding a listener at `address`
    pub fn bind_addr(&self, address: Address) -> String {
        format!("{}:{}", self.host, address)
    }
}
