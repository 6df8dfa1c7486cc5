//! Local network launcher.
//!
//! Starts the directory first, then every relay (each generates its keypair
//! and registers before the next one starts), then the users. All servers
//! share one shutdown signal.

use std::sync::Arc;

use axum::http::Method;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use onion_core::crypto::fingerprint;
use onion_core::{Error, MemoryNodeStore, RelayNode, Result, Sender};

use crate::client::HttpClient;
use crate::config::NetworkConfig;
use crate::node::{self, NodeState};
use crate::registry;
use crate::user::{self, UserState};

/// A running overlay. Dropping the handle also stops the servers, without
/// waiting for them.
pub struct NetworkHandle {
    relays: Vec<Arc<RelayNode>>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NetworkHandle {
    /// Relays in id order
    pub fn relays(&self) -> &[Arc<RelayNode>] {
        &self.relays
    }

    /// Stop every server and wait for in-flight requests to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Server task ended abnormally");
            }
        }
        tracing::info!("Network stopped");
    }
}

/// Start a directory, `config.relays` relays and `config.users` users.
pub async fn launch_network(config: NetworkConfig) -> Result<NetworkHandle> {
    let (shutdown, _) = watch::channel(false);
    let client = HttpClient::new(config.clone());
    let mut tasks = Vec::new();

    tasks.push(launch_registry(&config, &shutdown).await?);

    let mut relays = Vec::with_capacity(config.relays as usize);
    for node_id in 1..=config.relays {
        let (node, task) = launch_relay(&config, &client, node_id, &shutdown).await?;
        relays.push(node);
        tasks.push(task);
    }

    for user_id in 1..=config.users {
        tasks.push(launch_user(&config, &client, user_id, &shutdown).await?);
    }

    tracing::info!(
        relays = config.relays,
        users = config.users,
        forwarding = %config.forwarding,
        circuit_length = config.circuit_length,
        "Network ready"
    );

    Ok(NetworkHandle {
        relays,
        shutdown,
        tasks,
    })
}

async fn launch_registry(
    config: &NetworkConfig,
    shutdown: &watch::Sender<bool>,
) -> Result<JoinHandle<()>> {
    let store = Arc::new(MemoryNodeStore::new());
    let addr = format!("{}:{}", config.host, config.registry_port);
    serve(&addr, "directory", registry::router(store), shutdown).await
}

async fn launch_relay(
    config: &NetworkConfig,
    client: &HttpClient,
    node_id: u32,
    shutdown: &watch::Sender<bool>,
) -> Result<(Arc<RelayNode>, JoinHandle<()>)> {
    let node = Arc::new(RelayNode::generate(node_id).await?);
    let addr = config.bind_addr(config.addresses.relay_address(node_id)?);

    let state = NodeState {
        node: Arc::clone(&node),
        transport: Arc::new(client.clone()),
        forwarding: config.forwarding,
    };
    let task = serve(&addr, "relay", node::router(state), shutdown).await?;

    let public_key = node.export_public_key();
    tracing::info!(node_id, key = %fingerprint(&public_key), "Registering relay");
    client.register_node(node_id, public_key).await?;

    Ok((node, task))
}

async fn launch_user(
    config: &NetworkConfig,
    client: &HttpClient,
    user_id: u32,
    shutdown: &watch::Sender<bool>,
) -> Result<JoinHandle<()>> {
    let addr = config.bind_addr(config.addresses.user_address(user_id)?);
    let sender = Sender::new(client.clone(), client.clone(), config.addresses)
        .with_circuit_length(config.circuit_length);

    serve(&addr, "user", user::router(UserState::new(user_id, sender)), shutdown).await
}

/// Bind `addr` and serve `app` until the shutdown signal fires.
///
/// Returns once the listener is bound, so the server accepts connections as
/// soon as this resolves.
async fn serve(
    addr: &str,
    role: &'static str,
    app: Router,
    shutdown: &watch::Sender<bool>,
) -> Result<JoinHandle<()>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    let app = app.layer(cors).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind {} on {}: {}", role, addr, e)))?;
    tracing::debug!(role, addr, "Listening");

    let mut stop = shutdown.subscribe();
    let addr = addr.to_string();
    Ok(tokio::spawn(async move {
        let signal = async move {
            let _ = stop.wait_for(|stopped| *stopped).await;
        };
        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(signal).await {
            tracing::error!(role, addr = %addr, error = %e, "Server error");
        }
    }))
}
