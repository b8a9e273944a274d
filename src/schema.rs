//! Schema validation
//!
//! A schema maps keys to validator functions. It is advisory: the store
//! never runs it on write, callers ask through `Store::is_valid_data`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Validator for a single key's value
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Key -> validator mapping
#[derive(Clone, Default)]
pub struct Schema {
    validators: HashMap<String, Validator>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator for `key`, replacing any previous one
    pub fn field<F>(mut self, key: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validators.insert(key.into(), Arc::new(validator));
        self
    }

    /// Run the validator for `key`.
    ///
    /// Keys without a validator are rejected.
    pub fn check(&self, key: &str, value: &Value) -> bool {
        match self.validators.get(key) {
            Some(validator) => validator(value),
            None => false,
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.validators.keys().collect();
        keys.sort();
        f.debug_struct("Schema").field("keys", &keys).finish()
    }
}
