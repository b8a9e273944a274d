//! Transaction log record definitions

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single line of the transaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// ISO-8601 UTC timestamp, millisecond precision
    pub timestamp: String,

    /// The mutation that was applied
    pub action: Action,

    /// Affected key (`*` for clear and merge)
    pub key: String,

    /// New value, `null` for removals
    pub value: Value,
}

/// Mutations that can be logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Set,
    Remove,
    Update,
    Clear,
    /// Value is the merged object
    Merge,
}

/// Key recorded for actions that are not about a single entry
pub const ALL_KEYS: &str = "*";

impl LogRecord {
    /// Create a record stamped with the current time
    pub fn new(action: Action, key: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            action,
            key: key.into(),
            value: value.unwrap_or(Value::Null),
        }
    }
}
