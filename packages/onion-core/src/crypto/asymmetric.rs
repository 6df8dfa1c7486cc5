//! # Asymmetric Key Service
//!
//! Relay keypairs and the sealed box used to wrap per-hop session keys.
//!
//! ## Sealed Box Layout
//!
//! ```text
//! ┌──────────────────┬──────────────┬──────────────────────────────────┐
//! │ ephemeral pub    │ nonce        │ AES-256-GCM(ciphertext + tag)    │
//! │ 32 bytes         │ 12 bytes     │ plaintext length + 16 bytes      │
//! └──────────────────┴──────────────┴──────────────────────────────────┘
//!
//!   key = HKDF-SHA256(
//!     ikm  = X25519(ephemeral secret, relay public),
//!     salt = ephemeral pub || relay public,
//!     info = "onion-sealed-key-v1"
//!   )
//! ```
//!
//! A fresh ephemeral secret is drawn for every call, so sealing the same
//! session key twice never produces the same output.
//!
//! ## Size Limit
//!
//! Plaintexts are capped at [`MAX_SEALED_PLAINTEXT`] bytes. The protocol only
//! ever seals a 32-byte session key, which makes every wrapped key exactly
//! [`SEALED_KEY_LEN`] base64 characters long.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::symmetric::{NONCE_SIZE, TAG_SIZE};
use super::{from_base64, to_base64, KEY_SIZE};
use crate::error::{Error, Result};

/// Largest plaintext (in bytes) `encrypt` accepts.
pub const MAX_SEALED_PLAINTEXT: usize = 190;

/// Size of an X25519 public key in bytes
const PUBLIC_KEY_SIZE: usize = 32;

/// Bytes added by sealing: ephemeral public key, nonce and tag
const SEALED_OVERHEAD: usize = PUBLIC_KEY_SIZE + NONCE_SIZE + TAG_SIZE;

/// Length of a sealed session key in its base64 wire form.
pub const SEALED_KEY_LEN: usize = base64_len(KEY_SIZE + SEALED_OVERHEAD);

/// HKDF info string for sealed-box keys
const SEALED_KEY_INFO: &[u8] = b"onion-sealed-key-v1";

const fn base64_len(bytes: usize) -> usize {
    ((bytes + 2) / 3) * 4
}

/// A relay's public encryption key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(X25519PublicKey);

impl PublicKey {
    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.0.as_bytes()
    }
}

/// A relay's private decryption key
///
/// Zeroized when dropped.
#[derive(ZeroizeOnDrop)]
pub struct PrivateKey {
    #[zeroize(skip)] // x25519_dalek handles its own zeroization
    secret: StaticSecret,
}

impl PrivateKey {
    /// Derive the matching public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(X25519PublicKey::from(&self.secret))
    }
}

/// Keypair generated by a relay at startup and held for its lifetime
pub struct RelayKeyPair {
    public: PublicKey,
    private: PrivateKey,
}

impl RelayKeyPair {
    /// The shareable half
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The secret half
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Public key in its transportable form, as registered with the directory
    pub fn export_public(&self) -> String {
        export_public(&self.public)
    }
}

/// Generate a fresh keypair from the OS random number generator
pub fn generate_key_pair() -> RelayKeyPair {
    let secret = StaticSecret::random_from_rng(OsRng);
    let private = PrivateKey { secret };
    RelayKeyPair {
        public: private.public_key(),
        private,
    }
}

/// Export a public key as base64
pub fn export_public(key: &PublicKey) -> String {
    to_base64(key.as_bytes())
}

/// Export a private key as base64
///
/// Fails with `InvalidKey` when there is no key to export.
pub fn export_private(key: Option<&PrivateKey>) -> Result<String> {
    let key = key.ok_or_else(|| Error::InvalidKey("No private key to export".into()))?;
    let mut bytes = key.secret.to_bytes();
    let exported = to_base64(&bytes);
    bytes.zeroize();
    Ok(exported)
}

/// Import a public key exported by [`export_public`]
pub fn import_public(encoded: &str) -> Result<PublicKey> {
    let bytes = decode_key(encoded, "public")?;
    Ok(PublicKey(X25519PublicKey::from(bytes)))
}

/// Import a private key exported by [`export_private`]
pub fn import_private(encoded: &str) -> Result<PrivateKey> {
    let mut bytes = decode_key(encoded, "private")?;
    let secret = StaticSecret::from(bytes);
    bytes.zeroize();
    Ok(PrivateKey { secret })
}

fn decode_key(encoded: &str, kind: &str) -> Result<[u8; KEY_SIZE]> {
    let bytes = from_base64(encoded)
        .map_err(|e| Error::InvalidKey(format!("Invalid {} key encoding: {}", kind, e)))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        Error::InvalidKey(format!(
            "Invalid {} key length: expected {} bytes, got {}",
            kind,
            KEY_SIZE,
            b.len()
        ))
    })
}

/// Seal a base64 payload for the holder of `public_key`
///
/// ## Errors
///
/// - `InvalidKey` if `public_key` does not import
/// - `EncryptionFailed` if the payload is not base64 or exceeds
///   [`MAX_SEALED_PLAINTEXT`]
pub fn encrypt(plaintext_b64: &str, public_key: &str) -> Result<String> {
    let plaintext = from_base64(plaintext_b64)
        .map_err(|e| Error::EncryptionFailed(format!("Plaintext is not base64: {}", e)))?;

    if plaintext.len() > MAX_SEALED_PLAINTEXT {
        return Err(Error::EncryptionFailed(format!(
            "Plaintext is {} bytes, maximum is {}",
            plaintext.len(),
            MAX_SEALED_PLAINTEXT
        )));
    }

    let recipient = import_public(public_key)?;
    let sealed = seal(&recipient, &plaintext)?;
    Ok(to_base64(&sealed))
}

/// Open a sealed payload with this relay's private key
///
/// Returns the plaintext as base64. Fails with `DecryptionFailed` if the
/// ciphertext is malformed or was not sealed for this key.
pub fn decrypt(ciphertext_b64: &str, private_key: &PrivateKey) -> Result<String> {
    let sealed = from_base64(ciphertext_b64)
        .map_err(|e| Error::DecryptionFailed(format!("Ciphertext is not base64: {}", e)))?;
    let plaintext = open(private_key, &sealed)?;
    Ok(to_base64(&plaintext))
}

fn seal(recipient: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&recipient.0);

    let key = derive_sealing_key(shared.as_bytes(), ephemeral_public.as_bytes(), recipient.as_bytes())?;
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce), plaintext)
        .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))?;

    let mut sealed = Vec::with_capacity(SEALED_OVERHEAD + plaintext.len());
    sealed.extend_from_slice(ephemeral_public.as_bytes());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

fn open(private_key: &PrivateKey, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < SEALED_OVERHEAD {
        return Err(Error::DecryptionFailed(format!(
            "Sealed box is {} bytes, shorter than the {}-byte header",
            sealed.len(),
            SEALED_OVERHEAD
        )));
    }

    let (ephemeral_bytes, rest) = sealed.split_at(PUBLIC_KEY_SIZE);
    let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

    let mut ephemeral = [0u8; PUBLIC_KEY_SIZE];
    ephemeral.copy_from_slice(ephemeral_bytes);
    let ephemeral_public = X25519PublicKey::from(ephemeral);

    let shared = private_key.secret.diffie_hellman(&ephemeral_public);
    if !shared.was_contributory() {
        return Err(Error::DecryptionFailed("Degenerate ephemeral key".into()));
    }

    let recipient = private_key.public_key();
    let key = derive_sealing_key(shared.as_bytes(), &ephemeral, recipient.as_bytes())
        .map_err(|e| Error::DecryptionFailed(e.to_string()))?;
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| Error::DecryptionFailed(format!("Invalid key: {}", e)))?;

    cipher
        .decrypt(AesNonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::DecryptionFailed("Decryption failed: authentication tag mismatch".into()))
}

fn derive_sealing_key(
    shared: &[u8; 32],
    ephemeral_public: &[u8; PUBLIC_KEY_SIZE],
    recipient_public: &[u8; PUBLIC_KEY_SIZE],
) -> Result<[u8; KEY_SIZE]> {
    let mut salt = [0u8; PUBLIC_KEY_SIZE * 2];
    salt[..PUBLIC_KEY_SIZE].copy_from_slice(ephemeral_public);
    salt[PUBLIC_KEY_SIZE..].copy_from_slice(recipient_public);

    let hkdf = Hkdf::<Sha256>::new(Some(&salt), shared);
    let mut key = [0u8; KEY_SIZE];
    hkdf.expand(SEALED_KEY_INFO, &mut key)
        .map_err(|_| Error::EncryptionFailed("HKDF expansion failed".into()))?;
    Ok(key)
}

// ============================================================================
// TESTS
// ============================================================================
