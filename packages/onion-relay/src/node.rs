//! Relay node HTTP surface.
//!
//! ## Endpoints
//!
//! - `POST /message` - peel one layer and forward the remainder
//! - `GET /getLastReceivedEncryptedMessage`
//! - `GET /getLastReceivedDecryptedMessage`
//! - `GET /getLastMessageDestination`
//! - `GET /getLastObservedPath`
//! - `GET /getPrivateKey`
//! - `GET /status`

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use onion_core::{ForwardingMode, RelayNode, WireMessage};

use crate::api::ApiError;
use crate::client::HttpClient;
use crate::registry::status;

/// Shared relay state.
#[derive(Clone)]
pub struct NodeState {
    pub node: Arc<RelayNode>,
    pub transport: Arc<HttpClient>,
    pub forwarding: ForwardingMode,
}

/// Build the router for one relay.
pub fn router(state: NodeState) -> Router {
    Router::new()
        .route("/message", post(message))
        .route("/getLastReceivedEncryptedMessage", get(last_encrypted))
        .route("/getLastReceivedDecryptedMessage", get(last_decrypted))
        .route("/getLastMessageDestination", get(last_destination))
        .route("/getLastObservedPath", get(last_observed_path))
        .route("/getPrivateKey", get(private_key))
        .route("/status", get(status))
        .with_state(state)
}

async fn message(
    State(state): State<NodeState>,
    payload: Result<Json<WireMessage>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(message) = payload?;

    state
        .node
        .relay(message, Arc::clone(&state.transport), state.forwarding)
        .await?;

    Ok(Json(json!({ "success": true })))
}

async fn last_encrypted(State(state): State<NodeState>) -> Json<Value> {
    Json(json!({ "result": state.node.observations().last_encrypted }))
}

async fn last_decrypted(State(state): State<NodeState>) -> Json<Value> {
    Json(json!({ "result": state.node.observations().last_decrypted }))
}

async fn last_destination(State(state): State<NodeState>) -> Json<Value> {
    Json(json!({ "result": state.node.observations().last_destination }))
}

async fn last_observed_path(State(state): State<NodeState>) -> Json<Value> {
    Json(json!({ "result": state.node.observations().last_observed_path }))
}

async fn private_key(State(state): State<NodeState>) -> Result<Json<Value>, ApiError> {
    tracing::warn!(node_id = state.node.node_id(), "Private key requested");
    let key = state.node.export_private_key()?;
    Ok(Json(json!({ "result": key })))
}
