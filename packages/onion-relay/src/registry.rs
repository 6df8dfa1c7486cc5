//! Directory HTTP surface.
//!
//! ## Endpoints
//!
//! - `POST /registerNode` - `{nodeId, publicKey}`, overwrites any previous entry
//! - `GET /nodeList` - `{nodes: [...]}` sorted by node id
//! - `GET /status` - liveness

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use onion_core::crypto::fingerprint;
use onion_core::{DirectoryEntry, NodeList, NodeStore};

use crate::api::ApiError;

/// Directory state: whichever store backs it.
pub type RegistryState = Arc<dyn NodeStore>;

/// Build the directory router.
pub fn router(store: RegistryState) -> Router {
    Router::new()
        .route("/registerNode", post(register_node))
        .route("/nodeList", get(node_list))
        .route("/status", get(status))
        .with_state(store)
}

async fn register_node(
    State(store): State<RegistryState>,
    payload: Result<Json<DirectoryEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(entry) = payload?;

    if entry.public_key.trim().is_empty() {
        return Err(ApiError::BadRequest("publicKey must not be empty".into()));
    }

    tracing::info!(
        node_id = entry.node_id,
        key = %fingerprint(&entry.public_key),
        "Registering node"
    );
    store.register(entry.node_id, entry.public_key);

    Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}

async fn node_list(State(store): State<RegistryState>) -> Json<NodeList> {
    Json(NodeList {
        nodes: store.list(),
    })
}

/// Liveness check shared by every server.
pub async fn status() -> &'static str {
    "live"
}
