//! Peeling a single layer.

use super::address::Address;
use crate::crypto::{asymmetric, symmetric, PrivateKey, SymmetricKey, SEALED_KEY_LEN};
use crate::error::{Error, Result};

/// What one relay learns from its layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeeledLayer {
    /// Where the remainder must go
    pub next: Address,
    /// Next layer, or the plaintext if this was the last hop
    pub payload: String,
}

/// Open the session key sealed at the front of `blob`.
///
/// Returns the key and the still-encrypted body that follows it. Fails with
/// `KeyUnwrapFailed` if the layer was not sealed for `private_key`.
pub fn unwrap_session_key<'a>(
    blob: &'a str,
    private_key: &PrivateKey,
) -> Result<(SymmetricKey, &'a str)> {
    let wrapped = blob.get(..SEALED_KEY_LEN).ok_or_else(|| {
        Error::KeyUnwrapFailed(format!(
            "Message is shorter than the {}-character wrapped key",
            SEALED_KEY_LEN
        ))
    })?;

    let exported = asymmetric::decrypt(wrapped, private_key)
        .map_err(|e| Error::KeyUnwrapFailed(e.to_string()))?;
    let session_key =
        symmetric::import_key(&exported).map_err(|e| Error::KeyUnwrapFailed(e.to_string()))?;

    Ok((session_key, &blob[SEALED_KEY_LEN..]))
}

/// Peel exactly one layer with this relay's private key.
pub fn peel_layer(blob: &str, private_key: &PrivateKey) -> Result<PeeledLayer> {
    let (session_key, body) = unwrap_session_key(blob, private_key)?;

    let plaintext = symmetric::decrypt(&session_key, body)
        .map_err(|e| Error::PayloadDecryptFailed(e.to_string()))?;

    let (next, payload) = Address::split_prefix(&plaintext)?;
    Ok(PeeledLayer {
        next,
        payload: payload.to_string(),
    })
}
