//! # JsonKV
//!
//! A single-file, JSON-serialized key-value store for small embedded
//! applications, with:
//! - Whole-file durability after every mutation
//! - Named secondary indexes
//! - A bounded FIFO read cache
//! - An append-only transaction log
//! - Optional AES-256-GCM encryption at rest
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │              (Single Writer / Multi Reader)                 │
//! └──────┬──────────────┬──────────────┬──────────────┬─────────┘
//!        │              │              │              │
//!        ▼              ▼              ▼              ▼
//!  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐
//!  │   Cache   │  │  Indexes  │  │  TxLog    │  │  Backup   │
//!  │  (FIFO)   │  │ (derived) │  │ (append)  │  │ (thread)  │
//!  └───────────┘  └───────────┘  └───────────┘  └─────┬─────┘
//!                                                     │
//!        ┌────────────────────────────────────────────┘
//!        ▼
//!  ┌─────────────────────────┐
//!  │   Persistence Backend   │
//!  │  (JSON + AES-256-GCM)   │
//!  └─────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use jsonkv::{Config, Store};
//! use serde_json::json;
//!
//! let store = Store::open(Config::builder().path("bot.json").build())?;
//! store.set("user", "alice")?;
//! store.set("role", json!({ "type": "admin" }))?;
//!
//! store.create_index("type", |v| v.get("type").cloned());
//! assert_eq!(store.get_index_keys("type", "admin"), vec!["role".to_string()]);
//! # Ok::<(), jsonkv::StoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod schema;

pub mod persistence;
pub mod txlog;
pub mod index;
pub mod cache;
pub mod events;
pub mod backup;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{Config, IndexMaintenance};
pub use events::StoreEvent;
pub use index::IndexValue;
pub use schema::Schema;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of JsonKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
