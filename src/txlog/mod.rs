//! Transaction Log Module
//!
//! Human-auditable trail of every mutation, kept apart from the store file.
//!
//! ## Responsibilities
//! - Append one record per mutating call
//! - Never rewrite, compact or replay
//! - Best effort: a failed append never undoes the mutation
//!
//! ## File Format
//! ```text
//! {"timestamp":"2024-01-01T00:00:00.000Z","action":"set","key":"a","value":1}
//! {"timestamp":"2024-01-01T00:00:01.000Z","action":"remove","key":"a","value":null}
//! ```

mod record;
mod writer;

pub use record::{Action, LogRecord, ALL_KEYS};
pub use writer::TransactionLog;
