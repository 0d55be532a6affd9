// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the FieldSync orchestrator
//!
//! Engine lifecycle, session gating of maintenance, and configuration.

use fieldsync_core::api::{FieldSync, FieldSyncBuilder, FieldSyncConfig, FieldSyncError};
use fieldsync_core::sync::SessionError;
use fieldsync_core::{Direction, HistoryRecord};

fn incoming(peer: &str, rec: &str, ts: u64) -> HistoryRecord {
    HistoryRecord {
        peer_id: peer.to_string(),
        content_id: rec.to_string(),
        direction: Direction::Received,
        timestamp: ts,
        payload_size: None,
    }
}

#[test]
fn test_operations_require_open_store() {
    let engine = FieldSync::new(FieldSyncConfig::default()).unwrap();

    assert!(!engine.is_open());
    assert!(matches!(engine.ledger(), Err(FieldSyncError::NotOpened)));
    assert!(matches!(
        engine.begin_session("peer-a"),
        Err(FieldSyncError::NotOpened)
    ));
    assert!(matches!(
        engine.instance_key(),
        Err(FieldSyncError::NotOpened)
    ));
    assert!(matches!(
        engine.purge_before(100),
        Err(FieldSyncError::NotOpened)
    ));
}

#[test]
fn test_in_memory_round_trip() {
    let engine = FieldSync::in_memory("engine test passphrase").unwrap();
    assert!(engine.is_open());

    let ledger = engine.ledger().unwrap();
    ledger
        .record_exchange(&incoming("peer-a", "rec-1", 100))
        .unwrap();
    assert!(ledger
        .has_exchanged("peer-a", "rec-1", Direction::Received)
        .unwrap());
}

#[test]
fn test_open_creates_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("nested").join("fieldsync");

    let engine = FieldSync::new(FieldSyncConfig::new(&data_dir)).unwrap();
    engine.open("engine test passphrase").unwrap();

    assert!(data_dir.join("fieldsync.db").exists());
}

#[test]
fn test_second_open_keeps_first_store() {
    let engine = FieldSync::new(FieldSyncConfig::default()).unwrap();
    engine.open_in_memory("the first passphrase").unwrap();

    engine
        .ledger()
        .unwrap()
        .record_exchange(&incoming("peer-a", "rec-1", 100))
        .unwrap();

    // A later open with any passphrase lands on the already-open store
    engine.open_in_memory("something else entirely").unwrap();
    assert!(engine
        .ledger()
        .unwrap()
        .has_exchanged("peer-a", "rec-1", Direction::Received)
        .unwrap());
}

// =============================================================================
// Session Gating
// =============================================================================

#[test]
fn test_purge_refused_while_any_session_is_live() {
    let engine = FieldSync::in_memory("engine test passphrase").unwrap();
    engine
        .ledger()
        .unwrap()
        .record_exchange(&incoming("peer-a", "rec-1", 100))
        .unwrap();

    let session = engine.begin_session("peer-b").unwrap();
    assert!(matches!(
        engine.purge_before(200),
        Err(FieldSyncError::SessionActive(_))
    ));

    drop(session);
    let removed = engine.purge_before(200).unwrap();
    assert_eq!(removed, 1);
}

#[test]
fn test_clear_refused_only_for_the_busy_peer() {
    let engine = FieldSync::in_memory("engine test passphrase").unwrap();
    let ledger = engine.ledger().unwrap();
    ledger
        .record_exchange(&incoming("peer-a", "rec-1", 100))
        .unwrap();
    ledger
        .record_exchange(&incoming("peer-b", "rec-1", 100))
        .unwrap();

    let session = engine.begin_session("peer-a").unwrap();

    assert!(matches!(
        engine.clear_peer_history("peer-a"),
        Err(FieldSyncError::SessionActive(_))
    ));
    // Another peer's history is fair game
    assert_eq!(engine.clear_peer_history("peer-b").unwrap(), 1);

    drop(session);
    assert_eq!(engine.clear_peer_history("peer-a").unwrap(), 1);
}

#[test]
fn test_session_exclusivity_through_engine() {
    let engine = FieldSync::in_memory("engine test passphrase").unwrap();

    let _session = engine.begin_session("peer-a").unwrap();
    assert!(engine.session_active("peer-a").unwrap());

    let second = engine.begin_session("peer-a");
    assert!(matches!(
        second,
        Err(FieldSyncError::Session(SessionError::PeerBusy(_)))
    ));
}

// =============================================================================
// Instance Identity
// =============================================================================

#[test]
fn test_instance_key_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let key = {
        let engine = FieldSync::new(FieldSyncConfig::new(dir.path())).unwrap();
        engine.open("engine test passphrase").unwrap();
        engine.instance_key().unwrap()
    };
    assert!(!key.is_empty());

    let engine = FieldSync::new(FieldSyncConfig::new(dir.path())).unwrap();
    engine.open("engine test passphrase").unwrap();
    assert_eq!(engine.instance_key().unwrap(), key);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_rejects_empty_store_file_name() {
    let result = FieldSyncBuilder::new().store_file_name("").build();
    assert!(matches!(result, Err(FieldSyncError::Configuration(_))));
}

#[test]
fn test_config_rejects_zero_page_size() {
    let result = FieldSyncBuilder::new().history_page_size(0).build();
    assert!(matches!(result, Err(FieldSyncError::Configuration(_))));
}

#[test]
fn test_builder_applies_settings() {
    let engine = FieldSyncBuilder::new()
        .data_dir("/tmp/fieldsync-test")
        .store_file_name("custom.db")
        .history_page_size(64)
        .build()
        .unwrap();

    let config = engine.config();
    assert_eq!(config.store_file_name, "custom.db");
    assert_eq!(config.history_page_size, 64);
    assert_eq!(
        config.storage_path(),
        std::path::Path::new("/tmp/fieldsync-test/custom.db")
    );
}
