//! User HTTP surface: sender on one side, recipient on the other.
//!
//! ## Endpoints
//!
//! - `POST /message` - final hop delivery, the blob is the plaintext
//! - `POST /sendMessage` - `{message, destinationId}`, sends over a new circuit
//! - `GET /getLastReceivedMessage`
//! - `GET /getLastSentMessage`
//! - `GET /getLastCircuit`
//! - `GET /getLastObservedPath`
//! - `GET /status`

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use onion_core::{Sender, WireMessage};

use crate::api::ApiError;
use crate::client::HttpClient;
use crate::registry::status;

/// Body of `POST /sendMessage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub message: String,
    pub destination_id: u32,
}

/// What a user last sent and received. Last writer wins.
#[derive(Debug, Clone, Default)]
pub struct UserRecord {
    pub last_received: Option<String>,
    pub last_sent: Option<String>,
    pub last_circuit: Option<Vec<u32>>,
    pub last_observed_path: Option<Vec<u32>>,
}

/// Shared user state.
#[derive(Clone)]
pub struct UserState {
    pub user_id: u32,
    pub sender: Arc<Sender<HttpClient, HttpClient>>,
    pub record: Arc<RwLock<UserRecord>>,
}

impl UserState {
    pub fn new(user_id: u32, sender: Sender<HttpClient, HttpClient>) -> Self {
        Self {
            user_id,
            sender: Arc::new(sender),
            record: Arc::new(RwLock::new(UserRecord::default())),
        }
    }
}

/// Build the router for one user.
pub fn router(state: UserState) -> Router {
    Router::new()
        .route("/message", post(receive))
        .route("/sendMessage", post(send))
        .route("/getLastReceivedMessage", get(last_received))
        .route("/getLastSentMessage", get(last_sent))
        .route("/getLastCircuit", get(last_circuit))
        .route("/getLastObservedPath", get(last_observed_path))
        .route("/status", get(status))
        .with_state(state)
}

async fn receive(
    State(state): State<UserState>,
    payload: Result<Json<WireMessage>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(message) = payload?;

    tracing::info!(
        user_id = state.user_id,
        path = ?message.observed_path,
        "Message received"
    );

    let mut record = state.record.write();
    record.last_received = Some(message.blob);
    record.last_observed_path = Some(message.observed_path);

    Ok(Json(json!({ "success": true })))
}

async fn send(
    State(state): State<UserState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;

    if request.message.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".into()));
    }

    let sent = state
        .sender
        .send_message(&request.message, request.destination_id)
        .await?;

    {
        let mut record = state.record.write();
        record.last_sent = Some(request.message);
        record.last_circuit = Some(sent.circuit.clone());
    }

    Ok(Json(json!({ "success": true, "circuit": sent.circuit })))
}

async fn last_received(State(state): State<UserState>) -> Json<Value> {
    Json(json!({ "result": state.record.read().last_received }))
}

async fn last_sent(State(state): State<UserState>) -> Json<Value> {
    Json(json!({ "result": state.record.read().last_sent }))
}

async fn last_circuit(State(state): State<UserState>) -> Json<Value> {
    Json(json!({ "result": state.record.read().last_circuit }))
}

async fn last_observed_path(State(state): State<UserState>) -> Json<Value> {
    Json(json!({ "result": state.record.read().last_observed_path }))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::api::ErrorBody;
    use crate::config::NetworkConfig;

    fn app() -> Router {
        // Nothing listens on port 1, so any send that gets past validation
        // fails at the directory.
        let config = NetworkConfig {
            registry_port: 1,
            ..NetworkConfig::default()
        };
        let client = HttpClient::new(config.clone());
        let sender = Sender::new(client.clone(), client, config.addresses);
        router(UserState::new(7, sender))
    }

    fn post_json(path: &str, body: Value) -> Request<Body> {
        Request::post(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_receive_records_plaintext_and_path() {
        let app = app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/message",
                json!({ "blob": "hello", "observedPath": [4, 2, 9] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let received = app
            .clone()
            .oneshot(Request::get("/getLastReceivedMessage").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(received).await["result"], "hello");

        let path = app
            .oneshot(Request::get("/getLastObservedPath").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(path).await["result"], json!([4, 2, 9]));
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let response = app()
            .oneshot(post_json(
                "/sendMessage",
                json!({ "message": "", "destinationId": 1 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_service_unavailable() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_json(
                "/sendMessage",
                json!({ "message": "hi", "destinationId": 1 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorBody = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(body.code, 501);

        // A failed send records nothing
        let sent = app
            .oneshot(Request::get("/getLastSentMessage").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(sent).await["result"], Value::Null);
    }
}
