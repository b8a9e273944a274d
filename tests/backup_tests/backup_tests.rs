//! Tests for backups
//!
//! These tests verify:
//! - Manual backups to the default and custom paths
//! - Backups are encoded like the store file
//! - The periodic backup thread writes and stops on drop

use std::thread;
use std::time::{Duration, Instant};

use jsonkv::config::Config;
use jsonkv::store::Store;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Poll until `check` passes or the deadline expires
fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    check()
}

// =============================================================================
// Manual Backup Tests
// =============================================================================

#[test]
fn test_backup_writes_sibling_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path().join("db.json")).unwrap();

    store.set("a", 1).unwrap();
    let path = store.backup().unwrap();

    assert_eq!(path, temp_dir.path().join("db.json.backup"));
    assert_eq!(read_json(&path), json!({ "a": 1 }));
}

#[test]
fn test_backup_replaced_wholesale() {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path().join("db.json")).unwrap();

    store.set("a", 1).unwrap();
    store.backup().unwrap();
    store.remove("a").unwrap();
    store.set("b", 2).unwrap();
    let path = store.backup().unwrap();

    assert_eq!(read_json(&path), json!({ "b": 2 }));
}

#[test]
fn test_backup_to_custom_path() {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path().join("db.json")).unwrap();
    let custom = temp_dir.path().join("snapshots.json");

    store.set("k", "v").unwrap();
    store.backup_to(&custom).unwrap();

    assert_eq!(read_json(&custom), json!({ "k": "v" }));
}

#[test]
fn test_encrypted_backup_restorable_with_key() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("db.json"))
        .encryption_key("key")
        .build();
    let store = Store::open(config).unwrap();

    store.set("secret", "value").unwrap();
    let backup_path = store.backup().unwrap();

    assert!(!std::fs::read_to_string(&backup_path).unwrap().contains("value"));

    let restored = Store::open(
        Config::builder()
            .path(&backup_path)
            .encryption_key("key")
            .transaction_log(false)
            .build(),
    )
    .unwrap();
    assert_eq!(restored.get("secret"), Some(json!("value")));
}

// =============================================================================
// Auto Backup Tests
// =============================================================================

#[test]
fn test_auto_backup_runs_periodically() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("db.json"))
        .auto_backup_interval(Duration::from_millis(20))
        .build();
    let backup_path = config.backup_path();
    let store = Store::open(config).unwrap();
    assert!(store.auto_backup_enabled());

    store.set("a", 1).unwrap();
    assert!(wait_for(Duration::from_secs(5), || {
        std::fs::read_to_string(&backup_path)
            .ok()
            .and_then(|s| serde_json::from_str::<Value>(&s).ok())
            == Some(json!({ "a": 1 }))
    }));

    store.set("b", 2).unwrap();
    assert!(wait_for(Duration::from_secs(5), || {
        std::fs::read_to_string(&backup_path)
            .ok()
            .and_then(|s| serde_json::from_str::<Value>(&s).ok())
            == Some(json!({ "a": 1, "b": 2 }))
    }));
}

#[test]
fn test_auto_backup_stops_on_drop() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("db.json"))
        .auto_backup_interval(Duration::from_millis(10))
        .build();
    let backup_path = config.backup_path();
    let store = Store::open(config).unwrap();

    assert!(wait_for(Duration::from_secs(5), || backup_path.exists()));
    drop(store);

    std::fs::remove_file(&backup_path).unwrap();
    thread::sleep(Duration::from_millis(100));
    assert!(!backup_path.exists());
}

#[test]
fn test_auto_backup_disabled_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path().join("db.json")).unwrap();

    assert!(!store.auto_backup_enabled());
}
