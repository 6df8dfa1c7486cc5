//! # Symmetric Key Service
//!
//! AES-256-GCM session keys, one per (sender, hop, message).
//!
//! ## Wire Format
//!
//! ```text
//!   base64(nonce) ":" base64(ciphertext || tag)
//! ```
//!
//! The nonce is drawn from the OS RNG inside every `encrypt` call, so a
//! caller cannot reuse one. Random 96-bit nonces are safe far beyond the
//! single message each session key ever encrypts.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::ZeroizeOnDrop;

use super::{from_base64, to_base64, KEY_SIZE};
use crate::error::{Error, Result};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Separator between the nonce and ciphertext fields
const SEPARATOR: char = ':';

/// An AES-256-GCM session key
///
/// Zeroized when dropped.
#[derive(ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Generate a fresh random session key
pub fn generate_key() -> SymmetricKey {
    let mut bytes = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut bytes);
    SymmetricKey(bytes)
}

/// Export a session key as base64
pub fn export_key(key: &SymmetricKey) -> String {
    to_base64(&key.0)
}

/// Import a session key exported by [`export_key`]
pub fn import_key(encoded: &str) -> Result<SymmetricKey> {
    let bytes = from_base64(encoded)
        .map_err(|e| Error::InvalidKey(format!("Invalid symmetric key encoding: {}", e)))?;
    let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
        Error::InvalidKey(format!(
            "Invalid symmetric key length: expected {} bytes, got {}",
            KEY_SIZE,
            b.len()
        ))
    })?;
    Ok(SymmetricKey(bytes))
}

/// Encrypt `plaintext` under `key` with a fresh nonce
pub fn encrypt(key: &SymmetricKey, plaintext: &str) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))?;

    Ok(format!("{}{}{}", to_base64(&nonce), SEPARATOR, to_base64(&ciphertext)))
}

/// Decrypt the output of [`encrypt`]
///
/// ## Errors
///
/// Returns `DecryptionFailed` if:
/// - the separator is missing or a field is not base64
/// - the nonce has the wrong length
/// - the key is wrong or the ciphertext was tampered with
/// - the plaintext is not UTF-8
pub fn decrypt(key: &SymmetricKey, encrypted: &str) -> Result<String> {
    let (nonce_b64, ciphertext_b64) = encrypted
        .split_once(SEPARATOR)
        .ok_or_else(|| Error::DecryptionFailed("Missing nonce separator".into()))?;

    let nonce = from_base64(nonce_b64)
        .map_err(|e| Error::DecryptionFailed(format!("Invalid nonce encoding: {}", e)))?;
    if nonce.len() != NONCE_SIZE {
        return Err(Error::DecryptionFailed(format!(
            "Invalid nonce length: expected {} bytes, got {}",
            NONCE_SIZE,
            nonce.len()
        )));
    }

    let ciphertext = from_base64(ciphertext_b64)
        .map_err(|e| Error::DecryptionFailed(format!("Invalid ciphertext encoding: {}", e)))?;

    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| Error::DecryptionFailed(format!("Invalid key: {}", e)))?;

    let plaintext = cipher
        .decrypt(AesNonce::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|_| Error::DecryptionFailed("Decryption failed: authentication tag mismatch".into()))?;

    String::from_utf8(plaintext)
        .map_err(|_| Error::DecryptionFailed("Plaintext is not valid UTF-8".into()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_basic() {
        let key = generate_key();
        let encrypted = encrypt(&key, "Hello, World!").unwrap();
        assert_eq!(decrypt(&key, &encrypted).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let key = generate_key();
        let encrypted = encrypt(&key, "").unwrap();
        assert_eq!(decrypt(&key, &encrypted).unwrap(), "");
    }

    #[test]
    fn test_encrypt_decrypt_large() {
        let key = generate_key();
        let plaintext = "onion".repeat(20_000);
        let encrypted = encrypt(&key, &plaintext).unwrap();
        assert_eq!(decrypt(&key, &encrypted).unwrap(), plaintext);
    }

    #[test]
    fn test_nonce_freshness() {
        let key = generate_key();

        let a = encrypt(&key, "same input").unwrap();
        let b = encrypt(&key, "same input").unwrap();

        assert_ne!(a, b);
        let (nonce_a, _) = a.split_once(':').unwrap();
        let (nonce_b, _) = b.split_once(':').unwrap();
        assert_ne!(nonce_a, nonce_b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = generate_key();
        let key2 = generate_key();

        let encrypted = encrypt(&key1, "secret").unwrap();
        assert!(matches!(decrypt(&key2, &encrypted), Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = generate_key();
        let encrypted = encrypt(&key, "Hello, World!").unwrap();

        let (nonce, ciphertext) = encrypted.split_once(':').unwrap();
        let mut bytes = from_base64(ciphertext).unwrap();
        bytes[0] ^= 0xFF;
        let tampered = format!("{}:{}", nonce, to_base64(&bytes));

        assert!(matches!(decrypt(&key, &tampered), Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_malformed_input_fails() {
        let key = generate_key();

        for malformed in ["", "no-separator", "!!:!!", "AAAA:AAAA", ":"] {
            assert!(
                matches!(decrypt(&key, malformed), Err(Error::DecryptionFailed(_))),
                "accepted {:?}",
                malformed
            );
        }
    }

    #[test]
    fn test_export_import_round_trip() {
        let key = generate_key();
        let exported = export_key(&key);
        let imported = import_key(&exported).unwrap();

        assert_eq!(imported.as_bytes(), key.as_bytes());

        let encrypted = encrypt(&key, "interop").unwrap();
        assert_eq!(decrypt(&imported, &encrypted).unwrap(), "interop");
    }

    #[test]
    fn test_import_bad_key_fails() {
        assert!(matches!(import_key("AAAA"), Err(Error::InvalidKey(_))));
        assert!(matches!(import_key("***"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(generate_key().as_bytes(), generate_key().as_bytes());
    }
}
