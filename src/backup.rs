//! Periodic backups
//!
//! A background thread that copies the store state to `{path}.backup`
//! on a fixed interval. It only reads the state (under the read lock),
//! so it never blocks behind more than one in-flight mutation.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::persistence::JsonBackend;

/// Handle to the running backup thread.
///
/// Dropping it stops the thread and waits for it to exit.
pub struct AutoBackup {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutoBackup {
    /// Start backing up `state` to `path` every `interval`
    pub fn spawn(
        interval: Duration,
        state: Arc<RwLock<Map<String, Value>>>,
        backend: Arc<JsonBackend>,
        path: PathBuf,
    ) -> Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let target = path.display().to_string();

        let handle = thread::Builder::new()
            .name("jsonkv-backup".to_string())
            .spawn(move || {
                let ticker = channel::tick(interval);
                loop {
                    crossbeam::select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            let snapshot = state.read().clone();
                            match backend.save_to(&path, &snapshot) {
                                Ok(()) => tracing::debug!(path = %path.display(), "auto backup written"),
                                Err(e) => tracing::warn!(path = %path.display(), error = %e, "auto backup failed"),
                            }
                        }
                    }
                }
            })
            .map_err(|e| StoreError::Backup(format!("failed to spawn backup thread: {}", e)))?;

        tracing::info!(path = %target, interval_ms = interval.as_millis() as u64, "auto backup started");

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

impl Drop for AutoBackup {
    fn drop(&mut self) {
        // Dropping the sender disconnects the channel and wakes the thread
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("auto backup thread panicked");
            }
        }
    }
}
