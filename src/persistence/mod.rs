//! Persistence Module
//!
//! Durable storage of the store state as a single JSON file.
//!
//! ## Responsibilities
//! - Load the whole state at open (empty on any failure)
//! - Rewrite the whole file after every mutation
//! - Optional encryption of the serialized bytes
//!
//! ## File Format
//! ```text
//! {
//!   "key1": "value",
//!   "key2": { "nested": true }
//! }
//! ```
//! Pretty-printed with two-space indentation. When encrypted the file
//! holds hex text instead (see [`cipher`]).

pub mod cipher;
mod backend;

pub use backend::JsonBackend;
pub use cipher::Cipher;
