//! Delivery of wire messages between hops.

use async_trait::async_trait;

use crate::error::Result;
use crate::onion::{Address, WireMessage};

/// Hands a message to whatever listens at an address.
///
/// Relays and recipients both accept the same message shape, so a sender or
/// relay never needs to know which kind of endpoint it is talking to.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `message` to `to`. Failures are `ForwardingFailed`.
    async fn deliver(&self, to: Address, message: WireMessage) -> Result<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn deliver(&self, to: Address, message: WireMessage) -> Result<()> {
        (**self).deliver(to, message).await
    }
}
