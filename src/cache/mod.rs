//! Cache Module
//!
//! Bounded read cache in front of the store map.
//!
//! ## Responsibilities
//! - Serve repeated reads without touching the primary map
//! - Hold at most `cache_size` entries
//! - Evict strictly in insertion order (no promotion on hit)
//!
//! ## Data Structure Choice
//! HashMap + VecDeque:
//! - O(1) lookup and O(1) eviction from the front
//! - Invalidation is O(n) in the cache size, which is small by configuration

mod fifo;

pub use fifo::FifoCache;
