// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for store authentication
//!
//! Passphrase gating, reopen behavior, and persistence.

use fieldsync_core::storage::{Storage, StoreError};
use fieldsync_core::{Direction, HistoryRecord};

fn record(peer: &str, rec: &str, ts: u64) -> HistoryRecord {
    HistoryRecord {
        peer_id: peer.to_string(),
        content_id: rec.to_string(),
        direction: Direction::Received,
        timestamp: ts,
        payload_size: None,
    }
}

#[test]
fn test_reopen_with_same_passphrase_sees_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldsync.db");

    {
        let storage = Storage::open(&path, "open sesame with feeling").unwrap();
        storage.insert_history(&record("peer-a", "rec-1", 100)).unwrap();
    }

    let reopened = Storage::open(&path, "open sesame with feeling").unwrap();
    assert!(reopened
        .has_history_entry("peer-a", "rec-1", Direction::Received)
        .unwrap());
    assert_eq!(reopened.count_history_for_peer("peer-a").unwrap(), 1);
}

#[test]
fn test_reopen_with_wrong_passphrase_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldsync.db");

    {
        let storage = Storage::open(&path, "the right passphrase").unwrap();
        storage.insert_history(&record("peer-a", "rec-1", 100)).unwrap();
    }

    let wrong = Storage::open(&path, "not the right passphrase");
    assert!(matches!(wrong, Err(StoreError::AuthenticationFailed)));

    // The failed attempt must not damage the store
    let recovered = Storage::open(&path, "the right passphrase").unwrap();
    assert!(recovered
        .has_history_entry("peer-a", "rec-1", Direction::Received)
        .unwrap());
}

#[test]
fn test_empty_passphrase_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldsync.db");

    let result = Storage::open(&path, "");
    assert!(matches!(result, Err(StoreError::EmptyPassphrase)));
}

#[test]
fn test_in_memory_store_starts_empty() {
    let storage = Storage::in_memory("in memory passphrase").unwrap();
    assert_eq!(storage.count_history_for_peer("peer-a").unwrap(), 0);
}

#[test]
fn test_migrations_applied_on_open() {
    let storage = Storage::in_memory("in memory passphrase").unwrap();
    assert_eq!(storage.schema_version().unwrap(), 2);
}

#[test]
fn test_instance_key_stable_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldsync.db");

    let first_key = {
        let storage = Storage::open(&path, "instance key passphrase").unwrap();
        storage.instance_key().unwrap()
    };
    assert!(!first_key.is_empty());

    let reopened = Storage::open(&path, "instance key passphrase").unwrap();
    assert_eq!(reopened.instance_key().unwrap(), first_key);
}

#[test]
fn test_instance_keys_differ_between_stores() {
    let a = Storage::in_memory("instance key passphrase").unwrap();
    let b = Storage::in_memory("instance key passphrase").unwrap();
    assert_ne!(a.instance_key().unwrap(), b.instance_key().unwrap());
}
