//! Tests for the ordered persistent store
//!
//! These tests verify:
//! - Opening/creating the data file
//! - get/insert/remove semantics, including previous-value returns
//! - Persistence across reopen
//! - Key-ordered iteration and snapshot isolation
//! - Node splits under load, crash-tail recovery, compaction

use std::io::Write;
use std::path::PathBuf;

use corkboard::{Config, CorkboardError, Store, SyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path()).unwrap();
    (temp_dir, store)
}

fn data_file_path(dir: &TempDir) -> PathBuf {
    dir.path().join("corkboard.db")
}

fn collect_keys(store: &Store) -> Vec<String> {
    store
        .iter()
        .map(|entry| entry.unwrap().0)
        .collect::<Vec<_>>()
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_directory_and_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("data");

    assert!(!path.exists());

    let store = Store::open_path(&path).unwrap();

    assert!(path.join("corkboard.db").exists());
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
}

#[test]
fn test_open_rejects_foreign_file() {
    let temp_dir = TempDir::new().unwrap();
    // Big enough to cover the header, but with the wrong magic
    std::fs::write(data_file_path(&temp_dir), [0x42u8; 128]).unwrap();

    let result = Store::open_path(temp_dir.path());

    assert!(matches!(result, Err(CorkboardError::Corruption(_))));
}

// =============================================================================
// Point Operation Tests
// =============================================================================

#[test]
fn test_get_missing_returns_none() {
    let (_temp, store) = setup_store();

    assert_eq!(store.get("missing").unwrap(), None);
}

#[test]
fn test_insert_and_get() {
    let (_temp, store) = setup_store();

    let prev = store.insert("apple", b"red").unwrap();

    assert_eq!(prev, None);
    assert_eq!(store.get("apple").unwrap(), Some(b"red".to_vec()));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_insert_returns_previous_value() {
    let (_temp, store) = setup_store();

    store.insert("apple", b"red").unwrap();
    let prev = store.insert("apple", b"green").unwrap();

    assert_eq!(prev, Some(b"red".to_vec()));
    assert_eq!(store.get("apple").unwrap(), Some(b"green".to_vec()));
    // Overwrite, not a second entry
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove_returns_value() {
    let (_temp, store) = setup_store();

    store.insert("apple", b"red").unwrap();
    let removed = store.remove("apple").unwrap();

    assert_eq!(removed, Some(b"red".to_vec()));
    assert_eq!(store.get("apple").unwrap(), None);
    assert_eq!(store.len(), 0);
}

#[test]
fn test_remove_missing_is_noop() {
    let (_temp, store) = setup_store();

    store.insert("apple", b"red").unwrap();
    let removed = store.remove("banana").unwrap();

    assert_eq!(removed, None);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove_from_empty_store() {
    let (_temp, store) = setup_store();

    assert_eq!(store.remove("anything").unwrap(), None);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_persistence_across_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = Store::open_path(temp_dir.path()).unwrap();
        store.insert("k1", b"v1").unwrap();
        store.insert("k2", b"v2").unwrap();
        store.remove("k1").unwrap();
    }

    let store = Store::open_path(temp_dir.path()).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("k1").unwrap(), None);
    assert_eq!(store.get("k2").unwrap(), Some(b"v2".to_vec()));
}

#[test]
fn test_torn_tail_is_ignored_on_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = Store::open_path(temp_dir.path()).unwrap();
        store.insert("k1", b"v1").unwrap();
        store.insert("k2", b"v2").unwrap();
    }

    // Simulate a crash mid-append: junk bytes past the last committed root
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(data_file_path(&temp_dir))
        .unwrap();
    file.write_all(&[0xAB; 137]).unwrap();
    drop(file);

    let store = Store::open_path(temp_dir.path()).unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.get("k1").unwrap(), Some(b"v1".to_vec()));
    assert_eq!(store.get("k2").unwrap(), Some(b"v2".to_vec()));
}

#[test]
fn test_relaxed_sync_strategy_still_reads_back() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .sync_strategy(SyncStrategy::EveryNCommits { count: 50 })
        .build();

    {
        let store = Store::open(config.clone()).unwrap();
        for i in 0..20 {
            store.insert(&format!("key{:02}", i), b"value").unwrap();
        }
        store.sync().unwrap();
    }

    let store = Store::open(config).unwrap();
    assert_eq!(store.len(), 20);
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[test]
fn test_iteration_is_key_ordered() {
    let (_temp, store) = setup_store();

    for key in ["mango", "apple", "zebra", "banana", "cherry"] {
        store.insert(key, key.as_bytes()).unwrap();
    }

    let keys = collect_keys(&store);
    assert_eq!(keys, vec!["apple", "banana", "cherry", "mango", "zebra"]);
}

#[test]
fn test_iteration_empty_store() {
    let (_temp, store) = setup_store();

    assert_eq!(store.iter().count(), 0);
}

#[test]
fn test_iterator_sees_snapshot_at_creation() {
    let (_temp, store) = setup_store();

    store.insert("a", b"1").unwrap();
    store.insert("b", b"2").unwrap();

    let iter = store.iter();
    store.insert("c", b"3").unwrap();
    store.remove("a").unwrap();

    // The iterator walks the root committed when it was created
    let keys: Vec<String> = iter.map(|e| e.unwrap().0).collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(collect_keys(&store), vec!["b", "c"]);
}

// =============================================================================
// Split / Scale Tests
// =============================================================================

#[test]
fn test_many_entries_force_splits() {
    let (_temp, store) = setup_store();

    // Insert in a shuffled-ish order to exercise both split halves
    let count = 500u32;
    for i in 0..count {
        let key = format!("key{:05}", (i * 7919) % count);
        store.insert(&key, format!("value{}", i).as_bytes()).unwrap();
    }

    assert_eq!(store.len(), u64::from(count));

    // Every key readable
    for i in 0..count {
        let key = format!("key{:05}", i);
        assert!(store.get(&key).unwrap().is_some(), "missing {}", key);
    }

    // Iteration is complete and sorted
    let keys = collect_keys(&store);
    assert_eq!(keys.len(), count as usize);
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_splits_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = Store::open_path(temp_dir.path()).unwrap();
        for i in 0..300 {
            store.insert(&format!("key{:05}", i), b"value").unwrap();
        }
    }

    let store = Store::open_path(temp_dir.path()).unwrap();
    assert_eq!(store.len(), 300);
    assert_eq!(store.get("key00299").unwrap(), Some(b"value".to_vec()));
}

#[test]
fn test_delete_down_to_empty_and_refill() {
    let (_temp, store) = setup_store();

    for i in 0..200 {
        store.insert(&format!("key{:04}", i), b"value").unwrap();
    }
    for i in 0..200 {
        assert!(store.remove(&format!("key{:04}", i)).unwrap().is_some());
    }

    assert!(store.is_empty());
    assert_eq!(store.iter().count(), 0);

    // The emptied tree accepts new entries
    store.insert("fresh", b"start").unwrap();
    assert_eq!(store.get("fresh").unwrap(), Some(b"start".to_vec()));
    assert_eq!(store.len(), 1);
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compact_preserves_contents() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = Store::open_path(temp_dir.path()).unwrap();

    for i in 0..150 {
        store.insert(&format!("key{:04}", i), format!("value{}", i).as_bytes()).unwrap();
    }
    for i in (0..150).step_by(3) {
        store.remove(&format!("key{:04}", i)).unwrap();
    }

    let before = std::fs::metadata(data_file_path(&temp_dir)).unwrap().len();
    let keys_before = collect_keys(&store);

    store.compact().unwrap();

    let after = std::fs::metadata(data_file_path(&temp_dir)).unwrap().len();
    assert!(after < before, "compaction should shrink the file ({} -> {})", before, after);
    assert_eq!(collect_keys(&store), keys_before);
    assert_eq!(store.len(), keys_before.len() as u64);
    assert_eq!(store.get("key0001").unwrap(), Some(b"value1".to_vec()));
    assert_eq!(store.get("key0000").unwrap(), None);
}

#[test]
fn test_compact_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = Store::open_path(temp_dir.path()).unwrap();

    store.compact().unwrap();

    assert!(store.is_empty());
    store.insert("after", b"compact").unwrap();
    assert_eq!(store.get("after").unwrap(), Some(b"compact".to_vec()));
}

#[test]
fn test_compacted_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut store = Store::open_path(temp_dir.path()).unwrap();
        for i in 0..100 {
            store.insert(&format!("key{:04}", i), b"value").unwrap();
        }
        store.compact().unwrap();
        store.insert("post-compact", b"write").unwrap();
    }

    let store = Store::open_path(temp_dir.path()).unwrap();
    assert_eq!(store.len(), 101);
    assert_eq!(store.get("post-compact").unwrap(), Some(b"write".to_vec()));
}
