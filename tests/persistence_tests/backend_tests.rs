//! Tests for the JSON persistence backend
//!
//! These tests verify:
//! - Load degrades to an empty map on every kind of failure
//! - Save writes pretty-printed JSON and replaces prior contents
//! - Encryption round-trips and hides plaintext
//! - Cipher rejects tampered or truncated payloads

use std::fs;
use std::path::PathBuf;

use jsonkv::persistence::{Cipher, JsonBackend};
use jsonkv::StoreError;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_path() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.json");
    (temp_dir, path)
}

fn sample_state() -> Map<String, Value> {
    let mut state = Map::new();
    state.insert("name".to_string(), json!("gyo"));
    state.insert("stats".to_string(), json!({ "level": 3, "tags": ["a", "b"] }));
    state
}

// =============================================================================
// Load Tests
// =============================================================================

#[test]
fn test_load_missing_file_is_empty() {
    let (_temp, path) = setup_temp_path();
    let backend = JsonBackend::new(&path, None);

    assert!(backend.load().is_empty());
}

#[test]
fn test_load_malformed_json_is_empty() {
    let (_temp, path) = setup_temp_path();
    fs::write(&path, "{\"truncated\": ").unwrap();

    assert!(JsonBackend::new(&path, None).load().is_empty());
}

#[test]
fn test_load_directory_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let backend = JsonBackend::new(temp_dir.path(), None);

    assert!(backend.load().is_empty());
}

#[test]
fn test_decode_rejects_non_object_root() {
    let (_temp, path) = setup_temp_path();
    let backend = JsonBackend::new(&path, None);

    let err = backend.decode("\"just a string\"").unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

// =============================================================================
// Save Tests
// =============================================================================

#[test]
fn test_save_then_load_round_trip() {
    let (_temp, path) = setup_temp_path();
    let backend = JsonBackend::new(&path, None);

    backend.save(&sample_state()).unwrap();

    assert_eq!(backend.load(), sample_state());
}

#[test]
fn test_save_uses_two_space_indentation() {
    let (_temp, path) = setup_temp_path();
    let backend = JsonBackend::new(&path, None);

    let mut state = Map::new();
    state.insert("a".to_string(), json!({ "b": 1 }));
    backend.save(&state).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "{\n  \"a\": {\n    \"b\": 1\n  }\n}");
}

#[test]
fn test_save_replaces_previous_contents() {
    let (_temp, path) = setup_temp_path();
    let backend = JsonBackend::new(&path, None);

    backend.save(&sample_state()).unwrap();
    backend.save(&Map::new()).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
}

#[test]
fn test_save_into_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let backend = JsonBackend::new(temp_dir.path().join("missing").join("db.json"), None);

    let err = backend.save(&sample_state()).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}

#[test]
fn test_export_ignores_encryption() {
    let (temp, path) = setup_temp_path();
    let backend = JsonBackend::new(&path, Some("key"));
    let export_path = temp.path().join("export.json");

    backend.export(&export_path, &sample_state()).unwrap();

    let exported: Value = serde_json::from_str(&fs::read_to_string(&export_path).unwrap()).unwrap();
    assert_eq!(exported["name"], json!("gyo"));
}

// =============================================================================
// Encryption Tests
// =============================================================================

#[test]
fn test_encrypted_save_is_hex_text() {
    let (_temp, path) = setup_temp_path();
    let backend = JsonBackend::new(&path, Some("passphrase"));

    backend.save(&sample_state()).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(backend.is_encrypted());
    assert_eq!(backend.load(), sample_state());
}

#[test]
fn test_encrypted_load_with_wrong_key_is_empty() {
    let (_temp, path) = setup_temp_path();
    JsonBackend::new(&path, Some("right")).save(&sample_state()).unwrap();

    assert!(JsonBackend::new(&path, Some("wrong")).load().is_empty());
}

#[test]
fn test_encrypted_backend_rejects_plaintext_file() {
    let (_temp, path) = setup_temp_path();
    JsonBackend::new(&path, None).save(&sample_state()).unwrap();

    assert!(JsonBackend::new(&path, Some("key")).load().is_empty());
}

#[test]
fn test_cipher_uses_fresh_nonce() {
    let cipher = Cipher::from_passphrase("k");

    let a = cipher.encrypt(b"same").unwrap();
    let b = cipher.encrypt(b"same").unwrap();

    assert_ne!(a, b);
    assert_eq!(cipher.decrypt(&a).unwrap(), b"same");
    assert_eq!(cipher.decrypt(&b).unwrap(), b"same");
}

#[test]
fn test_cipher_detects_tampering() {
    let cipher = Cipher::from_passphrase("k");
    let mut sealed = cipher.encrypt(b"payload").unwrap();

    // Flip one hex digit in the ciphertext body
    let last = sealed.pop().unwrap();
    sealed.push(if last == '0' { '1' } else { '0' });

    assert!(matches!(cipher.decrypt(&sealed), Err(StoreError::Decryption(_))));
}

#[test]
fn test_cipher_rejects_short_and_invalid_input() {
    let cipher = Cipher::from_passphrase("k");

    assert!(matches!(cipher.decrypt("abcd"), Err(StoreError::Decryption(_))));
    assert!(matches!(cipher.decrypt("not hex at all"), Err(StoreError::Decryption(_))));
}

#[test]
fn test_cipher_debug_redacts_key() {
    let cipher = Cipher::from_passphrase("super-secret");

    let debug = format!("{:?}", cipher);
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("super-secret"));
}
