//! Onion construction, innermost layer first.

use super::address::Address;
use crate::crypto::{asymmetric, symmetric, SEALED_KEY_LEN};
use crate::error::{Error, Result};

/// One relay of a circuit, as the sender sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    /// Directory id of the relay
    pub node_id: u32,
    /// Exported public key from the directory
    pub public_key: String,
    /// Where the relay listens
    pub address: Address,
}

/// A fully built onion and the hop it must be handed to.
#[derive(Debug, Clone)]
pub struct Onion {
    /// Outermost layer
    pub blob: String,
    /// Address of the first hop
    pub entry: Address,
}

/// Build the onion for `message` over `hops` (in forwarding order).
///
/// Walks the circuit backwards: the innermost layer tells the last hop to
/// deliver to `destination`, and every outer layer tells its hop to forward
/// to the hop wrapped just before it. Construction is all-or-nothing; any
/// failure yields `OnionBuildFailed` and no partial onion.
pub fn build_onion(message: &str, hops: &[Hop], destination: Address) -> Result<Onion> {
    let entry = hops
        .first()
        .map(|hop| hop.address)
        .ok_or_else(|| Error::OnionBuildFailed("Circuit has no hops".into()))?;

    let mut payload = message.to_string();
    let mut next = destination;

    for hop in hops.iter().rev() {
        payload = wrap_layer(hop, next, &payload).map_err(|e| {
            Error::OnionBuildFailed(format!("Layer for node {}: {}", hop.node_id, e))
        })?;
        next = hop.address;
    }

    Ok(Onion {
        blob: payload,
        entry,
    })
}

/// `Seal(hop key, K) || Encrypt(K, next || inner)` with a fresh `K`.
fn wrap_layer(hop: &Hop, next: Address, inner: &str) -> Result<String> {
    let session_key = symmetric::generate_key();

    let mut plaintext = next.encode();
    plaintext.push_str(inner);
    let body = symmetric::encrypt(&session_key, &plaintext)?;

    let wrapped = asymmetric::encrypt(&symmetric::export_key(&session_key), &hop.public_key)?;
    if wrapped.len() != SEALED_KEY_LEN {
        return Err(Error::EncryptionFailed(format!(
            "Wrapped key is {} characters, expected {}",
            wrapped.len(),
            SEALED_KEY_LEN
        )));
    }

    let mut layer = wrapped;
    layer.push_str(&body);
    Ok(layer)
}
