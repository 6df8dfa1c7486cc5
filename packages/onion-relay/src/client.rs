//! HTTP client for the directory and for hop-to-hop delivery.
//!
//! One `HttpClient` serves both seams of the core: it reads the directory
//! for the sender and posts wire messages for senders and relays alike.

use async_trait::async_trait;
use reqwest::Client;

use onion_core::{
    Address, DirectoryEntry, Error, NodeDirectory, NodeList, Result, Transport, WireMessage,
};

use crate::api::ErrorBody;
use crate::config::NetworkConfig;

/// Shared, cheaply cloneable HTTP client.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: NetworkConfig,
}

impl HttpClient {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Register `node_id` with the directory.
    pub async fn register_node(&self, node_id: u32, public_key: String) -> Result<()> {
        let url = format!("{}/registerNode", self.config.registry_url());
        let entry = DirectoryEntry {
            node_id,
            public_key,
        };

        let response = self
            .client
            .post(&url)
            .json(&entry)
            .send()
            .await
            .map_err(|e| Error::DirectoryUnavailable(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::DirectoryUnavailable(format!(
                "registration of node {} answered {}",
                node_id,
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl NodeDirectory for HttpClient {
    async fn node_list(&self) -> Result<Vec<DirectoryEntry>> {
        let url = format!("{}/nodeList", self.config.registry_url());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::DirectoryUnavailable(format!("{}: {}", url, e)))?;

        let list: NodeList = response
            .json()
            .await
            .map_err(|e| Error::DirectoryUnavailable(format!("Malformed node list: {}", e)))?;

        Ok(list.nodes)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn deliver(&self, to: Address, message: WireMessage) -> Result<()> {
        let url = format!("{}/message", self.config.url_for(to));

        let response = self
            .client
            .post(&url)
            .json(&message)
            .send()
            .await
            .map_err(|e| Error::ForwardingFailed(format!("{}: {}", to, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(Error::ForwardingFailed(format!("{} answered {}: {}", to, status, detail)))
    }
}
