//! Index Module
//!
//! Named secondary indexes: derived value -> keys producing it.
//!
//! ## Responsibilities
//! - Build an index once from the current state (`create_index`)
//! - Explicit bucket maintenance (`add_to_index` / `remove_from_index`)
//! - Optional re-derivation on mutation (strict maintenance mode)
//!
//! Indexes live in memory only and are rebuilt on demand after a restart.

mod manager;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

pub use manager::IndexManager;

/// Derivation function: value -> index value (`None`/null = not indexed)
pub type Deriver = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Bucket key of an index.
///
/// Holds the canonical JSON text of the derived value, so `"1"` and `1`
/// land in different buckets while `2` and `2.0` share one.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexValue(String);

impl IndexValue {
    /// Canonical JSON text of the value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the bucket key back into a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::from_str(&self.0).unwrap_or(Value::Null)
    }
}

impl fmt::Debug for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Value> for IndexValue {
    fn from(value: &Value) -> Self {
        Self(canonical(value).to_string())
    }
}

impl From<Value> for IndexValue {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        Self::from(Value::from(value))
    }
}

impl From<String> for IndexValue {
    fn from(value: String) -> Self {
        Self::from(Value::from(value))
    }
}

impl From<i32> for IndexValue {
    fn from(value: i32) -> Self {
        Self::from(Value::from(value))
    }
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        Self::from(Value::from(value))
    }
}

impl From<u64> for IndexValue {
    fn from(value: u64) -> Self {
        Self::from(Value::from(value))
    }
}

impl From<f64> for IndexValue {
    fn from(value: f64) -> Self {
        Self::from(Value::from(value))
    }
}

impl From<bool> for IndexValue {
    fn from(value: bool) -> Self {
        Self::from(Value::from(value))
    }
}

/// Rewrite integral floats (at any depth) as integers
fn canonical(value: &Value) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => integral(f).unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), canonical(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Integer form of a finite float with no fractional part, if it fits
fn integral(f: f64) -> Option<Value> {
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Value::from(f as i64))
    } else if f >= 0.0 && f < u64::MAX as f64 {
        Some(Value::from(f as u64))
    } else {
        None
    }
}
