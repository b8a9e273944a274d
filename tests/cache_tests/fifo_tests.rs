//! FIFO Cache Tests
//!
//! Tests verify:
//! - Insertion-order eviction
//! - No promotion on hit
//! - Zero capacity bypass
//! - Invalidation and clear

use jsonkv::cache::FifoCache;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn keys(cache: &FifoCache) -> Vec<&str> {
    cache.keys().collect()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_cache_is_empty() {
    let cache = FifoCache::new(3);

    assert!(cache.is_empty());
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.capacity(), 3);
}

#[test]
fn test_insert_and_get() {
    let mut cache = FifoCache::new(3);

    cache.insert("a".to_string(), json!(1));

    assert_eq!(cache.get("a"), Some(&json!(1)));
    assert_eq!(cache.get("b"), None);
    assert!(cache.contains("a"));
}

#[test]
fn test_reinsert_replaces_in_place() {
    let mut cache = FifoCache::new(2);

    cache.insert("a".to_string(), json!(1));
    cache.insert("b".to_string(), json!(2));
    assert_eq!(cache.insert("a".to_string(), json!(10)), None);

    assert_eq!(cache.get("a"), Some(&json!(10)));
    assert_eq!(keys(&cache), vec!["a", "b"]);
}

// =============================================================================
// Eviction Tests
// =============================================================================

#[test]
fn test_evicts_first_inserted_at_capacity() {
    let mut cache = FifoCache::new(3);

    for (i, key) in ["k1", "k2", "k3"].iter().enumerate() {
        assert_eq!(cache.insert(key.to_string(), json!(i)), None);
    }
    let evicted = cache.insert("k4".to_string(), json!(4));

    assert_eq!(evicted, Some("k1".to_string()));
    assert_eq!(cache.len(), 3);
    assert_eq!(keys(&cache), vec!["k2", "k3", "k4"]);
}

#[test]
fn test_hit_does_not_promote() {
    let mut cache = FifoCache::new(2);

    cache.get_or_load("k1", || Some(json!(1)));
    cache.get_or_load("k2", || Some(json!(2)));
    cache.get_or_load("k1", || panic!("k1 is cached"));
    cache.get_or_load("k3", || Some(json!(3)));

    assert!(!cache.contains("k1"));
    assert_eq!(keys(&cache), vec!["k2", "k3"]);
}

#[test]
fn test_get_or_load_does_not_cache_misses() {
    let mut cache = FifoCache::new(2);

    assert_eq!(cache.get_or_load("missing", || None), None);
    assert!(cache.is_empty());
}

#[test]
fn test_get_or_load_returns_loaded_value() {
    let mut cache = FifoCache::new(2);

    let value = cache.get_or_load("k", || Some(json!({ "v": true })));

    assert_eq!(value, Some(json!({ "v": true })));
    assert_eq!(cache.get("k"), Some(&json!({ "v": true })));
}

#[test]
fn test_zero_capacity_never_stores() {
    let mut cache = FifoCache::new(0);

    assert_eq!(cache.insert("a".to_string(), json!(1)), None);
    assert_eq!(cache.get_or_load("b", || Some(json!(2))), Some(json!(2)));

    assert!(cache.is_empty());
}

#[test]
fn test_capacity_one() {
    let mut cache = FifoCache::new(1);

    cache.insert("a".to_string(), Value::Null);
    let evicted = cache.insert("b".to_string(), Value::Null);

    assert_eq!(evicted, Some("a".to_string()));
    assert_eq!(keys(&cache), vec!["b"]);
}

// =============================================================================
// Invalidation Tests
// =============================================================================

#[test]
fn test_invalidate_keeps_order_of_rest() {
    let mut cache = FifoCache::new(3);

    for key in ["a", "b", "c"] {
        cache.insert(key.to_string(), json!(key));
    }

    assert!(cache.invalidate("b"));
    assert!(!cache.invalidate("b"));
    assert_eq!(keys(&cache), vec!["a", "c"]);

    // Freed slot is reused without evicting
    assert_eq!(cache.insert("d".to_string(), json!("d")), None);
    assert_eq!(cache.insert("e".to_string(), json!("e")), Some("a".to_string()));
}

#[test]
fn test_clear() {
    let mut cache = FifoCache::new(2);

    cache.insert("a".to_string(), json!(1));
    cache.insert("b".to_string(), json!(2));
    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(keys(&cache), Vec::<&str>::new());
}
