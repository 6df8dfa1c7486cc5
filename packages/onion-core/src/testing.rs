//! In-process transports for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::onion::{Address, WireMessage};
use crate::relay::{ForwardingMode, RelayNode};
use crate::transport::Transport;

/// Records deliveries, or refuses all of them.
pub struct RecordingTransport {
    fail: bool,
    count: AtomicUsize,
    tx: mpsc::UnboundedSender<(Address, WireMessage)>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<(Address, WireMessage)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            fail: false,
            count: AtomicUsize::new(0),
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn delivered(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub async fn next_delivery(&self) -> (Address, WireMessage) {
        self.rx.lock().await.recv().await.unwrap()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn deliver(&self, to: Address, message: WireMessage) -> Result<()> {
        if self.fail {
            return Err(Error::ForwardingFailed(format!("{} refused", to)));
        }
        self.count.fetch_add(1, Ordering::SeqCst);
        let _ = self.tx.send((to, message));
        Ok(())
    }
}

/// Relays and recipient inboxes wired together without sockets.
#[derive(Clone, Default)]
pub struct LocalNetwork {
    relays: Arc<Mutex<HashMap<Address, Arc<RelayNode>>>>,
    inboxes: Arc<Mutex<HashMap<Address, Vec<WireMessage>>>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_relay(&self, address: Address, node: Arc<RelayNode>) {
        self.relays.lock().insert(address, node);
    }

    pub fn add_recipient(&self, address: Address) {
        self.inboxes.lock().insert(address, Vec::new());
    }

    pub fn inbox(&self, address: Address) -> Vec<WireMessage> {
        self.inboxes.lock().get(&address).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Transport for LocalNetwork {
    async fn deliver(&self, to: Address, message: WireMessage) -> Result<()> {
        let relay = self.relays.lock().get(&to).cloned();
        if let Some(node) = relay {
            return node
                .relay(message, Arc::new(self.clone()), ForwardingMode::Acknowledged)
                .await;
        }

        match self.inboxes.lock().get_mut(&to) {
            Some(inbox) => {
                inbox.push(message);
                Ok(())
            }
            None => Err(Error::ForwardingFailed(format!("nothing listens at {}", to))),
        }
    }
}
