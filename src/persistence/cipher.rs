//! Encryption at rest
//!
//! AES-256-GCM over the serialized document. The passphrase is stretched to a
//! 256-bit key with SHA-256. Output layout before hex encoding:
//!
//! ```text
//! ┌────────────┬──────────────────┬──────────┐
//! │ Nonce (12) │ Ciphertext (N)   │ Tag (16) │
//! └────────────┴──────────────────┴──────────┘
//! ```
//!
//! The on-disk form is lowercase hex so the store file stays UTF-8 text.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Result, StoreError};

/// Size of the GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Symmetric cipher applied to whole-file payloads
pub struct Cipher {
    cipher: Aes256Gcm,
}

impl Cipher {
    /// Derive the cipher key from a passphrase
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypt `plaintext` into hex text
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| StoreError::Encryption("AES-GCM encryption error".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend(ciphertext);

        Ok(hex::encode(sealed))
    }

    /// Decrypt hex text produced by [`encrypt`](Self::encrypt)
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>> {
        let sealed = hex::decode(encoded.trim())
            .map_err(|e| StoreError::Decryption(format!("invalid hex payload: {}", e)))?;

        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(StoreError::Decryption("ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| StoreError::Decryption("wrong key or corrupted data".to_string()))
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher").field("key", &"[REDACTED]").finish()
    }
}
