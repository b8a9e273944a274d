//! JSON file backend
//!
//! Reads and writes the whole store state as one document.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::Result;

use super::Cipher;

/// Whole-file JSON persistence for the store state
#[derive(Debug)]
pub struct JsonBackend {
    /// Backing file
    path: PathBuf,

    /// Present when encryption at rest is enabled
    cipher: Option<Cipher>,
}

impl JsonBackend {
    /// Create a backend for `path`, encrypting when a passphrase is given
    pub fn new(path: impl Into<PathBuf>, encryption_key: Option<&str>) -> Self {
        Self {
            path: path.into(),
            cipher: encryption_key.map(Cipher::from_passphrase),
        }
    }

    /// Load the store state.
    ///
    /// Never fails: a missing, unreadable, undecryptable or malformed file
    /// yields an empty map.
    pub fn load(&self) -> Map<String, Value> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => self.decode_or_empty(&raw),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "store file unreadable, starting empty");
                Map::new()
            }
        }
    }

    /// Persist the store state, replacing the file contents
    pub fn save(&self, state: &Map<String, Value>) -> Result<()> {
        self.save_to(&self.path, state)
    }

    /// Persist the state to another path using this backend's encryption
    pub fn save_to(&self, path: &Path, state: &Map<String, Value>) -> Result<()> {
        let payload = self.encode(state)?;
        fs::write(path, payload)?;
        tracing::debug!(path = %path.display(), entries = state.len(), "store state written");
        Ok(())
    }

    /// Write the state to `path` as plaintext JSON regardless of encryption
    pub fn export(&self, path: &Path, state: &Map<String, Value>) -> Result<()> {
        let payload = serde_json::to_string_pretty(state)?;
        fs::write(path, payload)?;
        tracing::debug!(path = %path.display(), entries = state.len(), "store exported");
        Ok(())
    }

    /// Serialize (and encrypt if configured) the state
    pub fn encode(&self, state: &Map<String, Value>) -> Result<String> {
        let json = serde_json::to_string_pretty(state)?;
        match &self.cipher {
            Some(cipher) => cipher.encrypt(json.as_bytes()),
            None => Ok(json),
        }
    }

    /// Decrypt (if configured) and parse file contents
    pub fn decode(&self, raw: &str) -> Result<Map<String, Value>> {
        let value: Value = match &self.cipher {
            Some(cipher) => serde_json::from_slice(&cipher.decrypt(raw)?)?,
            None => serde_json::from_str(raw)?,
        };

        match value {
            Value::Object(map) => Ok(map),
            other => {
                let e: serde_json::Error = serde::de::Error::custom(format!(
                    "store root must be a JSON object, found {}",
                    type_name(&other)
                ));
                Err(e.into())
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file that async saves are staged in (`{path}.tmp`)
    #[cfg(feature = "async")]
    pub fn staging_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }

    /// Move a staged file over the backing file
    #[cfg(feature = "async")]
    pub fn commit_staged(&self) -> Result<()> {
        fs::rename(self.staging_path(), &self.path)?;
        tracing::debug!(path = %self.path.display(), "staged state committed");
        Ok(())
    }

    /// Delete a staged file that was superseded
    #[cfg(feature = "async")]
    pub fn discard_staged(&self) {
        let staging = self.staging_path();
        if let Err(e) = fs::remove_file(&staging) {
            tracing::warn!(path = %staging.display(), error = %e, "failed to remove staged state");
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    fn decode_or_empty(&self, raw: &str) -> Map<String, Value> {
        match self.decode(raw) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "store file unusable, starting empty");
                Map::new()
            }
        }
    }

    // =========================================================================
    // Async variants
    // =========================================================================

    /// Async [`load`](Self::load)
    #[cfg(feature = "async")]
    pub async fn load_async(&self) -> Map<String, Value> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => self.decode_or_empty(&raw),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "store file unreadable, starting empty");
                Map::new()
            }
        }
    }

    /// Async [`save`](Self::save). Callers must not run two concurrently.
    #[cfg(feature = "async")]
    pub async fn save_async(&self, state: &Map<String, Value>) -> Result<()> {
        let payload = self.encode(state)?;
        tokio::fs::write(&self.path, payload).await?;
        tracing::debug!(path = %self.path.display(), entries = state.len(), "store state written");
        Ok(())
    }

    /// Write the state to [`staging_path`](Self::staging_path) without
    /// touching the backing file; finish with `commit_staged`
    #[cfg(feature = "async")]
    pub async fn stage_async(&self, state: &Map<String, Value>) -> Result<()> {
        let payload = self.encode(state)?;
        tokio::fs::write(self.staging_path(), payload).await?;
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
