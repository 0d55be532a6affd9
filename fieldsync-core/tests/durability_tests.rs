// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Crash and Restart Durability Tests
//!
//! Each exchange commits in its own transaction, so a process that dies
//! mid-session must leave exactly the committed prefix behind: no halves
//! of a record, no lost commits, and a retried session converges on the
//! same end state. These tests simulate a crash by dropping every handle
//! and opening the store file again through a fresh provider, the way a
//! restarted process would.

use std::path::Path;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use fieldsync_core::ledger::LedgerError;
use fieldsync_core::storage::Storage;
use fieldsync_core::{Direction, HistoryRecord, ReceivedHistoryLedger, StorageProvider};

const PASSPHRASE: &str = "durability test passphrase";

fn record(peer: &str, rec: &str, ts: u64) -> HistoryRecord {
    HistoryRecord {
        peer_id: peer.to_string(),
        content_id: rec.to_string(),
        direction: Direction::Received,
        timestamp: ts,
        payload_size: None,
    }
}

/// Opens the store the way a freshly started process would.
fn open_generation(path: &Path) -> ReceivedHistoryLedger {
    let provider = StorageProvider::new();
    let handle = provider.open(path, PASSPHRASE).unwrap();
    ReceivedHistoryLedger::new(handle)
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// =============================================================================
// CRASH PREFIX TESTS
// =============================================================================

#[test]
fn test_reopen_sees_exactly_the_committed_prefix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fieldsync.db");

    let planned = ids(&[
        "rec-0", "rec-1", "rec-2", "rec-3", "rec-4", "rec-5", "rec-6", "rec-7", "rec-8", "rec-9",
    ]);

    // The process dies after committing the first five units.
    {
        let ledger = open_generation(&path);
        for (i, id) in planned.iter().take(5).enumerate() {
            ledger
                .record_exchange(&record("peer-a", id, i as u64))
                .unwrap();
        }
    }

    let ledger = open_generation(&path);
    assert_eq!(ledger.count_for_peer("peer-a").unwrap(), 5);

    let unknown = ledger
        .filter_unknown("peer-a", &planned, Direction::Received)
        .unwrap();
    assert_eq!(unknown, ids(&["rec-5", "rec-6", "rec-7", "rec-8", "rec-9"]));
}

#[test]
fn test_crash_between_batches_preserves_committed_batches() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fieldsync.db");

    {
        let ledger = open_generation(&path);
        let first_batch: Vec<HistoryRecord> = (0..8)
            .map(|i| record("peer-a", &format!("batch1-{i}"), i))
            .collect();
        let commit = ledger.record_all(&first_batch).unwrap();
        assert_eq!(commit.recorded, 8);
        // Crash before the second batch is assembled
    }

    let ledger = open_generation(&path);
    assert_eq!(ledger.count_for_peer("peer-a").unwrap(), 8);

    let history: Vec<HistoryRecord> = ledger
        .history_for_peer("peer-a")
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(history.len(), 8);
    for (i, rec) in history.iter().enumerate() {
        assert_eq!(rec.content_id, format!("batch1-{i}"));
    }
}

#[test]
fn test_session_retry_after_crash_converges() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fieldsync.db");

    let planned = ids(&["rec-0", "rec-1", "rec-2", "rec-3", "rec-4"]);

    {
        let ledger = open_generation(&path);
        for (i, id) in planned.iter().take(3).enumerate() {
            ledger
                .record_exchange(&record("peer-a", id, i as u64))
                .unwrap();
        }
    }

    // The retried session replays every unit; the committed prefix
    // answers DuplicateExchange and the rest lands normally.
    let ledger = open_generation(&path);
    let mut duplicates = 0;
    for (i, id) in planned.iter().enumerate() {
        match ledger.record_exchange(&record("peer-a", id, i as u64)) {
            Ok(()) => {}
            Err(LedgerError::DuplicateExchange) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(duplicates, 3);
    assert_eq!(ledger.count_for_peer("peer-a").unwrap(), 5);
    for id in &planned {
        assert!(ledger
            .has_exchanged("peer-a", id, Direction::Received)
            .unwrap());
    }
}

// =============================================================================
// FAILED COMMIT TESTS
// =============================================================================

#[test]
fn test_validation_failure_leaves_committed_records_intact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fieldsync.db");

    {
        let ledger = open_generation(&path);
        for i in 0..3 {
            ledger
                .record_exchange(&record("peer-a", &format!("rec-{i}"), i))
                .unwrap();
        }

        let result = ledger.record_exchange(&record("peer-a", "", 99));
        assert!(matches!(result, Err(LedgerError::ConstraintViolation(_))));
    }

    let ledger = open_generation(&path);
    assert_eq!(ledger.count_for_peer("peer-a").unwrap(), 3);
}

#[test]
fn test_failed_batch_validation_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fieldsync.db");

    {
        let ledger = open_generation(&path);
        let batch = vec![
            record("peer-a", "rec-0", 0),
            record("peer-a", "", 1),
            record("peer-a", "rec-2", 2),
        ];

        // Validation runs before any I/O, so the valid records around
        // the bad one must not land either.
        let result = ledger.record_all(&batch);
        assert!(matches!(result, Err(LedgerError::ConstraintViolation(_))));
        assert_eq!(ledger.count_for_peer("peer-a").unwrap(), 0);
    }

    let ledger = open_generation(&path);
    assert_eq!(ledger.count_for_peer("peer-a").unwrap(), 0);
}

// =============================================================================
// CONCURRENT FIRST OPEN
// =============================================================================

#[test]
fn test_concurrent_first_open_converges_on_one_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fieldsync.db");

    // Two processes race to create the same store file. The slow KDF
    // keeps both in flight at once; whoever inserts the bootstrap row
    // second must adopt the winner's salt instead of its own.
    let path_a = path.clone();
    let opener_a = thread::spawn(move || Storage::open(&path_a, PASSPHRASE));

    let path_b = path.clone();
    let opener_b = thread::spawn(move || {
        thread::sleep(Duration::from_millis(75));
        Storage::open(&path_b, PASSPHRASE)
    });

    let storage_a = opener_a.join().unwrap().unwrap();
    let storage_b = opener_b.join().unwrap().unwrap();

    // A record sealed by one opener must unseal under the other's keys.
    storage_a
        .insert_history(&record("peer-a", "rec-1", 10))
        .unwrap();
    drop(storage_a);

    assert!(storage_b
        .has_history_entry("peer-a", "rec-1", Direction::Received)
        .unwrap());
    let page = storage_b.history_page("peer-a", None, 10).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].0.content_id, "rec-1");
}
