//! Index manager
//!
//! Owns every named index of a store.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::{Deriver, IndexValue};

/// A single named index
#[derive(Default)]
struct Index {
    /// index value -> keys, in the order they were added
    buckets: HashMap<IndexValue, Vec<String>>,

    /// Set when built by `create_index`; used by strict maintenance
    derive: Option<Deriver>,
}

impl Index {
    fn add(&mut self, value: IndexValue, key: &str) {
        let bucket = self.buckets.entry(value).or_default();
        if !bucket.iter().any(|k| k == key) {
            bucket.push(key.to_string());
        }
    }

    fn remove(&mut self, value: &IndexValue, key: &str) -> bool {
        let Some(bucket) = self.buckets.get_mut(value) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|k| k == key) else {
            return false;
        };

        bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(value);
        }
        true
    }
}

/// Registry of named secondary indexes
///
/// Not synchronized; the store guards it with a lock.
#[derive(Default)]
pub struct IndexManager {
    indexes: HashMap<String, Index>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build `name` from `entries` unless it already exists.
    ///
    /// Returns false when the index existed; it is NOT refreshed.
    pub fn create_index<'a, I>(&mut self, name: &str, derive: Deriver, entries: I) -> bool
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        if self.indexes.contains_key(name) {
            return false;
        }

        let mut index = Index::default();
        for (key, value) in entries {
            if let Some(derived) = derive_value(&derive, value) {
                index.add(derived, key);
            }
        }
        index.derive = Some(derive);

        tracing::debug!(index = name, buckets = index.buckets.len(), "index built");
        self.indexes.insert(name.to_string(), index);
        true
    }

    /// Add `key` to a bucket, creating the index and bucket as needed
    pub fn add_to_index(&mut self, name: &str, value: impl Into<IndexValue>, key: &str) {
        self.indexes
            .entry(name.to_string())
            .or_default()
            .add(value.into(), key);
    }

    /// Remove `key` from a bucket; empty buckets are dropped.
    ///
    /// Returns whether anything was removed.
    pub fn remove_from_index(&mut self, name: &str, value: impl Into<IndexValue>, key: &str) -> bool {
        match self.indexes.get_mut(name) {
            Some(index) => index.remove(&value.into(), key),
            None => false,
        }
    }

    /// Keys in a bucket (empty on any miss)
    pub fn get_index_keys(&self, name: &str, value: impl Into<IndexValue>) -> Vec<String> {
        self.indexes
            .get(name)
            .and_then(|index| index.buckets.get(&value.into()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    pub fn has_bucket(&self, name: &str, value: impl Into<IndexValue>) -> bool {
        self.indexes
            .get(name)
            .is_some_and(|index| index.buckets.contains_key(&value.into()))
    }

    /// Drop an index entirely so the next `create_index` rebuilds it
    pub fn drop_index(&mut self, name: &str) -> bool {
        self.indexes.remove(name).is_some()
    }

    /// Names of all indexes, sorted
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.keys().cloned().collect();
        names.sort();
        names
    }

    // =========================================================================
    // Strict maintenance
    // =========================================================================

    /// Move `key` between buckets of every derived index after its value
    /// changed from `old` to `new` (either may be absent)
    pub fn reindex_key(&mut self, key: &str, old: Option<&Value>, new: Option<&Value>) {
        for index in self.indexes.values_mut() {
            let Some(derive) = index.derive.clone() else {
                continue;
            };

            if let Some(previous) = old.and_then(|v| derive_value(&derive, v)) {
                index.remove(&previous, key);
            }
            if let Some(current) = new.and_then(|v| derive_value(&derive, v)) {
                index.add(current, key);
            }
        }
    }

    /// Empty every derived index (used when the whole state is replaced)
    pub fn clear_derived(&mut self) {
        for index in self.indexes.values_mut() {
            if index.derive.is_some() {
                index.buckets.clear();
            }
        }
    }

    /// Rebuild every derived index from `entries`
    pub fn rebuild_derived(&mut self, entries: &Map<String, Value>) {
        self.clear_derived();
        for index in self.indexes.values_mut() {
            let Some(derive) = index.derive.clone() else {
                continue;
            };
            for (key, value) in entries {
                if let Some(derived) = derive_value(&derive, value) {
                    index.add(derived, key);
                }
            }
        }
    }
}

/// Run a deriver; `None` and JSON null both mean "not indexed"
fn derive_value(derive: &Deriver, value: &Value) -> Option<IndexValue> {
    match derive(value) {
        Some(Value::Null) | None => None,
        Some(derived) => Some(IndexValue::from(derived)),
    }
}
