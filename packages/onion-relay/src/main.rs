//! Onion Relay
//!
//! Runs a complete local onion routing overlay in one process:
//!
//! 1. **Directory**: maps relay ids to public keys and hands out the listing
//!    senders draw circuits from.
//!
//! 2. **Relays**: each peels one layer of every message it receives and
//!    forwards the remainder to the next hop.
//!
//! 3. **Users**: send messages over fresh random circuits and receive the
//!    plaintext at the end of someone else's circuit.
//!
//! **Privacy**: a relay learns only its predecessor and its successor. Only
//! the last relay and the recipient ever see the plaintext.

mod api;
mod client;
mod config;
mod network;
mod node;
mod registry;
mod user;

use clap::Parser;
use onion_core::{AddressPlan, ForwardingMode};

use config::NetworkConfig;

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "onion-relay", version, about = "Local onion routing overlay")]
struct Args {
    /// Number of relays to start
    #[arg(long, default_value_t = 10, env = "ONION_RELAYS")]
    relays: u32,

    /// Number of users to start
    #[arg(long, default_value_t = 2, env = "ONION_USERS")]
    users: u32,

    /// Interface to bind and dial
    #[arg(long, default_value = "127.0.0.1", env = "ONION_HOST")]
    host: String,

    /// Directory port
    #[arg(long, default_value_t = 8080, env = "ONION_REGISTRY_PORT")]
    registry_port: u16,

    /// Relay `n` listens on this port plus `n`
    #[arg(long, default_value_t = 4000, env = "ONION_BASE_RELAY_PORT")]
    base_relay_port: u32,

    /// User `u` listens on this port plus `u`
    #[arg(long, default_value_t = 3000, env = "ONION_BASE_USER_PORT")]
    base_user_port: u32,

    /// Hops per circuit
    #[arg(long, default_value_t = onion_core::DEFAULT_CIRCUIT_LENGTH, env = "ONION_CIRCUIT_LENGTH")]
    circuit_length: usize,

    /// When relays acknowledge: `detached` or `acknowledged`
    #[arg(long, default_value_t = ForwardingMode::Detached, env = "ONION_FORWARDING")]
    forwarding: ForwardingMode,

    /// Emit logs as JSON lines
    #[arg(long, env = "ONION_JSON_LOGS")]
    json_logs: bool,
}

impl From<Args> for NetworkConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            registry_port: args.registry_port,
            relays: args.relays,
            users: args.users,
            addresses: AddressPlan {
                base_relay_port: args.base_relay_port,
                base_user_port: args.base_user_port,
            },
            circuit_length: args.circuit_length,
            forwarding: args.forwarding,
        }
    }
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "onion_relay=info,onion_core=info,tower_http=info".into());
    if args.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = NetworkConfig::from(args);
    tracing::info!(
        registry = %config.registry_url(),
        relays = config.relays,
        users = config.users,
        "Onion overlay starting"
    );

    let network = match network::launch_network(config).await {
        Ok(network) => network,
        Err(e) => {
            tracing::error!(error = %e, code = e.code(), "Failed to launch network");
            std::process::exit(1);
        }
    };

    for node in network.relays() {
        tracing::debug!(node_id = node.node_id(), "Relay online");
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }

    tracing::info!("Shutting down");
    network.shutdown().await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
