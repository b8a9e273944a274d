//! Store Module
//!
//! The public key-value map that coordinates all components.
//!
//! ## Responsibilities
//! - Own the in-memory state (source of truth)
//! - Persist the whole state after every mutation
//! - Append to the transaction log
//! - Keep the cache and (in strict mode) the indexes in step with the state
//! - Notify event listeners

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use serde_json::{Map, Value};

use crate::backup::AutoBackup;
use crate::cache::FifoCache;
use crate::config::{Config, IndexMaintenance};
use crate::error::Result;
use crate::events::{EventBus, StoreEvent};
use crate::index::{Deriver, IndexManager, IndexValue};
use crate::persistence::JsonBackend;
use crate::txlog::{Action, TransactionLog, ALL_KEYS};

/// A JSON-file-backed key-value store
///
/// ## Concurrency Model: Single Writer
///
/// - **Writes** (set/remove/clear/update/merge): serialized by `write_lock`.
///   Each write mutates the state under its write lock, downgrades to a read
///   lock and rewrites the file before returning.
/// - **Reads**: take the state read lock only.
/// - Lock order is always state -> indexes -> cache.
///
/// Callbacks passed to `update`, `validate`, `create_index` and event
/// listeners run while store locks are held (listeners excepted: they run
/// after the write completes). They must not call back into mutating
/// store methods.
///
/// ## Durability
///
/// Memory is the source of truth. If the file write fails the mutation
/// stays applied in memory, the error is returned, and the file lags behind
/// until the next successful write (see [`Store::flush`]).
pub struct Store {
    /// Store configuration
    config: Config,

    /// Whole-file JSON persistence
    backend: Arc<JsonBackend>,

    /// Current key-value state, insertion ordered
    state: Arc<RwLock<Map<String, Value>>>,

    /// Named secondary indexes
    indexes: RwLock<IndexManager>,

    /// FIFO read cache used by `get_with_cache`
    cache: Mutex<FifoCache>,

    /// Audit log (None when disabled)
    txlog: Option<TransactionLog>,

    /// Mutation listeners
    events: EventBus,

    /// Serializes write operations
    write_lock: Mutex<()>,

    /// Bumped on every state change; lets async saves detect staleness
    generation: AtomicU64,

    /// Serializes async load/save
    #[cfg(feature = "async")]
    async_lock: tokio::sync::Mutex<()>,

    /// Background backup thread, stopped on drop
    auto_backup: Option<AutoBackup>,
}

impl Store {
    /// Open a store with the given config
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Load the backing file (empty state on any failure)
    /// 3. Start the backup thread if configured
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let backend = Arc::new(JsonBackend::new(
            &config.path,
            config.encryption_key.as_deref(),
        ));
        let state = Arc::new(RwLock::new(backend.load()));

        let txlog = config
            .transaction_log
            .then(|| TransactionLog::new(config.log_path()));

        let auto_backup = match config.auto_backup_interval {
            Some(interval) => Some(AutoBackup::spawn(
                interval,
                Arc::clone(&state),
                Arc::clone(&backend),
                config.backup_path(),
            )?),
            None => None,
        };

        tracing::info!(
            path = %config.path.display(),
            entries = state.read().len(),
            encrypted = backend.is_encrypted(),
            "store opened"
        );

        Ok(Self {
            cache: Mutex::new(FifoCache::new(config.cache_size)),
            config,
            backend,
            state,
            indexes: RwLock::new(IndexManager::new()),
            txlog,
            events: EventBus::new(),
            write_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            #[cfg(feature = "async")]
            async_lock: tokio::sync::Mutex::new(()),
            auto_backup,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified backing file
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().path(path.as_ref()).build();
        Self::open(config)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.read().get(key).cloned()
    }

    /// Check whether a key exists
    pub fn has(&self, key: &str) -> bool {
        self.state.read().contains_key(key)
    }

    /// Snapshot of the whole state
    pub fn get_all(&self) -> Map<String, Value> {
        self.state.read().clone()
    }

    /// Number of entries
    pub fn size(&self) -> usize {
        self.state.read().len()
    }

    /// Entries whose value is a string containing `query`
    pub fn search(&self, query: &str) -> Map<String, Value> {
        self.state
            .read()
            .iter()
            .filter(|(_, value)| matches!(value, Value::String(s) if s.contains(query)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// First key (insertion order) whose value equals `value`
    pub fn get_key_by_value(&self, value: &Value) -> Option<String> {
        self.state
            .read()
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(key, _)| key.clone())
    }

    /// All keys whose value equals `value`, in insertion order
    pub fn get_keys_by_value(&self, value: &Value) -> Vec<String> {
        self.state
            .read()
            .iter()
            .filter(|(_, v)| *v == value)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Run `predicate` on the current value; `None` if the key is missing
    pub fn validate<F>(&self, key: &str, predicate: F) -> Option<bool>
    where
        F: FnOnce(&Value) -> bool,
    {
        self.state.read().get(key).map(predicate)
    }

    /// 1-indexed page of entries in iteration order.
    ///
    /// Out-of-range pages (and page 0 or size 0) are empty.
    pub fn get_page(&self, page: usize, page_size: usize) -> Map<String, Value> {
        if page == 0 || page_size == 0 {
            return Map::new();
        }
        let Some(start) = (page - 1).checked_mul(page_size) else {
            return Map::new();
        };

        self.state
            .read()
            .iter()
            .skip(start)
            .take(page_size)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Check a value against the configured schema.
    ///
    /// Without a schema everything is valid; with one, keys it does not
    /// mention are invalid.
    pub fn is_valid_data(&self, key: &str, value: &Value) -> bool {
        match &self.config.schema {
            Some(schema) => schema.check(key, value),
            None => true,
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert or overwrite a key
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        {
            let _write_guard = self.write_lock.lock();

            let mut state = self.state.write();
            let previous = state.insert(key.clone(), value.clone());
            self.after_change(&key, previous.as_ref(), Some(&value));
            self.persist(state)?;

            self.log(Action::Set, &key, Some(&value));
        }

        tracing::debug!(key = %key, "set");
        self.events.emit(&StoreEvent::Set { key, value });
        Ok(())
    }

    /// Remove a key (the file is rewritten even if it was absent)
    pub fn remove(&self, key: &str) -> Result<()> {
        let removed = {
            let _write_guard = self.write_lock.lock();

            let mut state = self.state.write();
            let removed = state.shift_remove(key);
            self.after_change(key, removed.as_ref(), None);
            self.persist(state)?;

            self.log(Action::Remove, key, None);
            removed
        };

        tracing::debug!(key = %key, existed = removed.is_some(), "remove");
        if removed.is_some() {
            self.events.emit(&StoreEvent::Remove {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<()> {
        {
            let _write_guard = self.write_lock.lock();

            let mut state = self.state.write();
            state.clear();
            if self.config.index_maintenance == IndexMaintenance::Strict {
                self.indexes.write().clear_derived();
            }
            self.cache.lock().clear();
            self.persist(state)?;

            self.log(Action::Clear, ALL_KEYS, None);
        }

        tracing::debug!("clear");
        self.events.emit(&StoreEvent::Clear);
        Ok(())
    }

    /// Replace an existing value with `transform(current)`.
    ///
    /// Returns the new value, or `None` without side effects if the key is
    /// missing.
    pub fn update<F>(&self, key: &str, transform: F) -> Result<Option<Value>>
    where
        F: FnOnce(&Value) -> Value,
    {
        let updated = {
            let _write_guard = self.write_lock.lock();

            let mut state = self.state.write();
            let Some(current) = state.get_mut(key) else {
                return Ok(None);
            };
            let updated = transform(&*current);
            let previous = std::mem::replace(current, updated.clone());
            self.after_change(key, Some(&previous), Some(&updated));
            self.persist(state)?;

            self.log(Action::Update, key, Some(&updated));
            updated
        };

        tracing::debug!(key = %key, "update");
        self.events.emit(&StoreEvent::Update {
            key: key.to_string(),
            value: updated.clone(),
        });
        Ok(Some(updated))
    }

    /// Overlay `other` onto the state (incoming keys win) with one file write
    pub fn merge(&self, other: Map<String, Value>) -> Result<()> {
        let keys: Vec<String> = other.keys().cloned().collect();

        {
            let _write_guard = self.write_lock.lock();

            let mut state = self.state.write();
            for (key, value) in other.iter() {
                let previous = state.insert(key.clone(), value.clone());
                self.after_change(key, previous.as_ref(), Some(value));
            }
            self.persist(state)?;

            self.log(Action::Merge, ALL_KEYS, Some(&Value::Object(other)));
        }

        tracing::debug!(count = keys.len(), "merge");
        self.events.emit(&StoreEvent::Merge { keys });
        Ok(())
    }

    /// Rewrite the backing file from memory.
    ///
    /// Restores durability after a failed write.
    pub fn flush(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        let state = self.state.read();
        self.backend.save(&state)
    }

    /// Discard memory state and load the backing file again.
    ///
    /// Returns the number of entries loaded.
    pub fn reload(&self) -> usize {
        let _write_guard = self.write_lock.lock();
        let loaded = self.backend.load();
        self.replace_state(loaded)
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Write the current state as plaintext JSON to an arbitrary path
    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let state = self.state.read();
        self.backend.export(path.as_ref(), &state)
    }

    /// Write a backup to `{path}.backup`, returning the backup path
    pub fn backup(&self) -> Result<PathBuf> {
        let path = self.config.backup_path();
        self.backup_to(&path)?;
        Ok(path)
    }

    /// Write a backup to `path`, encoded like the backing file
    pub fn backup_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = self.state.read().clone();
        self.backend.save_to(path.as_ref(), &snapshot)?;
        tracing::info!(path = %path.as_ref().display(), entries = snapshot.len(), "backup written");
        Ok(())
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    /// Build index `name` from the current values unless it already exists.
    ///
    /// `derive` returning `None` or null leaves the entry out. Returns false
    /// if the index already existed (it is not refreshed).
    pub fn create_index<F>(&self, name: &str, derive: F) -> bool
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        let derive: Deriver = Arc::new(derive);
        let state = self.state.read();
        self.indexes
            .write()
            .create_index(name, derive, state.iter())
    }

    /// Add `key` under `value` in index `name`
    pub fn add_to_index(&self, name: &str, value: impl Into<IndexValue>, key: &str) {
        self.indexes.write().add_to_index(name, value, key);
    }

    /// Remove `key` from under `value` in index `name`
    pub fn remove_from_index(&self, name: &str, value: impl Into<IndexValue>, key: &str) {
        self.indexes.write().remove_from_index(name, value, key);
    }

    /// Keys stored under `value` in index `name`
    pub fn get_index_keys(&self, name: &str, value: impl Into<IndexValue>) -> Vec<String> {
        self.indexes.read().get_index_keys(name, value)
    }

    /// Whether index `name` has a bucket for `value`
    pub fn has_index_bucket(&self, name: &str, value: impl Into<IndexValue>) -> bool {
        self.indexes.read().has_bucket(name, value)
    }

    /// Drop index `name`
    pub fn drop_index(&self, name: &str) -> bool {
        self.indexes.write().drop_index(name)
    }

    /// Names of all indexes
    pub fn index_names(&self) -> Vec<String> {
        self.indexes.read().index_names()
    }

    // =========================================================================
    // Cache
    // =========================================================================

    /// Read through the FIFO cache
    pub fn get_with_cache(&self, key: &str) -> Option<Value> {
        let state = self.state.read();
        let mut cache = self.cache.lock();
        cache.get_or_load(key, || state.get(key).cloned())
    }

    /// Cached keys, oldest first
    pub fn cached_keys(&self) -> Vec<String> {
        self.cache.lock().keys().map(str::to_string).collect()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Register a listener called after every committed mutation
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener);
    }

    // =========================================================================
    // Async variants
    // =========================================================================

    /// Async [`flush`](Self::flush); concurrent async calls are queued.
    ///
    /// The snapshot is staged asynchronously and swapped in under the write
    /// lock. If a mutation landed in between, the current state is written
    /// instead.
    #[cfg(feature = "async")]
    pub async fn flush_async(&self) -> Result<()> {
        let _async_guard = self.async_lock.lock().await;
        let (snapshot, generation) = {
            let state = self.state.read();
            (state.clone(), self.generation.load(Ordering::Acquire))
        };
        self.backend.stage_async(&snapshot).await?;

        let _write_guard = self.write_lock.lock();
        if self.generation.load(Ordering::Acquire) == generation {
            return self.backend.commit_staged();
        }

        tracing::debug!("state changed during async flush, writing current state");
        self.backend.discard_staged();
        let state = self.state.read();
        self.backend.save(&state)
    }

    /// Async [`reload`](Self::reload); concurrent async calls are queued.
    ///
    /// A mutation committed while the file was being read makes the loaded
    /// copy stale, so it is read again under the write lock.
    #[cfg(feature = "async")]
    pub async fn reload_async(&self) -> usize {
        let _async_guard = self.async_lock.lock().await;
        let generation = self.generation.load(Ordering::Acquire);
        let loaded = self.backend.load_async().await;

        let _write_guard = self.write_lock.lock();
        if self.generation.load(Ordering::Acquire) == generation {
            return self.replace_state(loaded);
        }
        let loaded = self.backend.load();
        self.replace_state(loaded)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        self.backend.path()
    }

    /// Whether the background backup thread is running
    pub fn auto_backup_enabled(&self) -> bool {
        self.auto_backup.is_some()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Keep cache and strict indexes in step with one key's change
    fn after_change(&self, key: &str, old: Option<&Value>, new: Option<&Value>) {
        if self.config.index_maintenance == IndexMaintenance::Strict {
            self.indexes.write().reindex_key(key, old, new);
        }
        self.cache.lock().invalidate(key);
    }

    /// Swap in a freshly loaded state (write lock held by caller)
    fn replace_state(&self, loaded: Map<String, Value>) -> usize {
        let mut state = self.state.write();
        *state = loaded;
        self.generation.fetch_add(1, Ordering::AcqRel);
        if self.config.index_maintenance == IndexMaintenance::Strict {
            self.indexes.write().rebuild_derived(&state);
        }
        self.cache.lock().clear();

        tracing::info!(path = %self.backend.path().display(), entries = state.len(), "store reloaded");
        state.len()
    }

    /// Downgrade to a read lock and rewrite the backing file
    fn persist(&self, state: RwLockWriteGuard<'_, Map<String, Value>>) -> Result<()> {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let state = RwLockWriteGuard::downgrade(state);
        self.backend.save(&state).map_err(|e| {
            tracing::warn!(path = %self.backend.path().display(), error = %e, "store write failed, file is behind memory");
            e
        })
    }

    /// Best-effort append to the transaction log
    fn log(&self, action: Action, key: &str, value: Option<&Value>) {
        let Some(txlog) = &self.txlog else {
            return;
        };
        if let Err(e) = txlog.append(action, key, value) {
            tracing::warn!(path = %txlog.path().display(), action = ?action, key = %key, error = %e, "transaction log append failed");
        }
    }
}
