//! FIFO cache implementation
//!
//! HashMap for lookups plus a VecDeque recording insertion order.

use std::collections::{HashMap, VecDeque};

use serde_json::Value;

/// Bounded cache that evicts the oldest-inserted entry first
#[derive(Debug)]
pub struct FifoCache {
    /// Max number of entries (0 = never cache)
    capacity: usize,

    /// Cached values
    entries: HashMap<String, Value>,

    /// Keys in insertion order, front = next to evict
    order: VecDeque<String>,
}

impl FifoCache {
    /// Create an empty cache bounded to `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Look up a cached value. Hits do not change eviction order.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Return the cached value, or call `load` and cache what it returns.
    ///
    /// `None` from the loader is passed through and not cached.
    pub fn get_or_load<F>(&mut self, key: &str, load: F) -> Option<Value>
    where
        F: FnOnce() -> Option<Value>,
    {
        if let Some(value) = self.entries.get(key) {
            return Some(value.clone());
        }

        let value = load()?;
        self.insert(key.to_string(), value.clone());
        Some(value)
    }

    /// Insert a value, returning the key evicted to make room.
    ///
    /// Re-inserting a cached key replaces its value in place.
    pub fn insert(&mut self, key: String, value: Value) -> Option<String> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return None;
        }

        let mut evicted = None;
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        evicted
    }

    /// Drop a key from the cache, keeping the order of the rest
    pub fn invalidate(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        self.order.retain(|k| k != key);
        true
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Cached keys, oldest first
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
