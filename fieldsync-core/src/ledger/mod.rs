// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Received History Ledger
//!
//! The dedup and commit engine over the encrypted store. The transport
//! layer asks the ledger which content ids are still unknown for a peer
//! before streaming, and commits one exchange record per transferred
//! unit. Every commit is one atomic transaction; there is no partial
//! state a crash could leave half-visible.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::debug;

use crate::storage::{
    BatchCommit, Direction, HistoryCursor, HistoryRecord, StorageHandle, StoreError,
};

/// Records fetched per page when walking a peer's history.
pub const DEFAULT_PAGE_SIZE: usize = 256;

/// Ledger error types.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Exchange already recorded for this peer, content and direction")]
    DuplicateExchange,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(&'static str),
}

/// Dedup decision and commit engine for completed exchanges.
///
/// Answers "has this unit of data already been exchanged with this
/// peer?" and records exchanges as they complete. Handles are cheap to
/// clone; all clones share the same underlying store.
#[derive(Clone)]
pub struct ReceivedHistoryLedger {
    storage: StorageHandle,
    page_size: usize,
}

impl ReceivedHistoryLedger {
    /// Creates a ledger over an open store.
    pub fn new(storage: StorageHandle) -> Self {
        Self::with_page_size(storage, DEFAULT_PAGE_SIZE)
    }

    /// Creates a ledger with a custom history page size.
    pub fn with_page_size(storage: StorageHandle, page_size: usize) -> Self {
        ReceivedHistoryLedger {
            storage,
            page_size: page_size.max(1),
        }
    }

    /// Returns true iff this exchange has been recorded.
    pub fn has_exchanged(
        &self,
        peer_id: &str,
        content_id: &str,
        direction: Direction,
    ) -> Result<bool, LedgerError> {
        validate_id(peer_id, "peer identifier must not be empty")?;
        validate_id(content_id, "content identifier must not be empty")?;

        let store = self.storage.lock()?;
        Ok(store.has_history_entry(peer_id, content_id, direction)?)
    }

    /// Returns the content ids with no exchange record for this peer and
    /// direction, in first-occurrence order with duplicates collapsed.
    ///
    /// Equivalent to calling [`ReceivedHistoryLedger::has_exchanged`]
    /// per id and keeping the misses, but issues a bounded number of
    /// queries however large the batch is.
    pub fn filter_unknown(
        &self,
        peer_id: &str,
        content_ids: &[String],
        direction: Direction,
    ) -> Result<Vec<String>, LedgerError> {
        validate_id(peer_id, "peer identifier must not be empty")?;
        for id in content_ids {
            validate_id(id, "content identifier must not be empty")?;
        }

        let store = self.storage.lock()?;
        let unknown = store.filter_unknown(peer_id, content_ids, direction)?;

        debug!(
            candidates = content_ids.len(),
            unknown = unknown.len(),
            "filtered sync batch"
        );
        Ok(unknown)
    }

    /// Records one completed exchange.
    ///
    /// Fails with [`LedgerError::DuplicateExchange`] when the same
    /// (peer, content, direction) triple is already recorded. That
    /// outcome means the desired end state already holds; callers
    /// retrying a session treat it as success.
    pub fn record_exchange(&self, record: &HistoryRecord) -> Result<(), LedgerError> {
        validate_record(record)?;

        let store = self.storage.lock()?;
        match store.insert_history(record) {
            Ok(()) => Ok(()),
            Err(StoreError::AlreadyExists(_)) => Err(LedgerError::DuplicateExchange),
            Err(e) => Err(e.into()),
        }
    }

    /// Records a batch of completed exchanges in one atomic commit.
    ///
    /// Already-recorded triples are skipped and counted, never fatal.
    /// All records are validated before any I/O happens.
    pub fn record_all(&self, records: &[HistoryRecord]) -> Result<BatchCommit, LedgerError> {
        for record in records {
            validate_record(record)?;
        }

        let store = self.storage.lock()?;
        Ok(store.insert_history_batch(records)?)
    }

    /// Walks a peer's history ordered by exchange timestamp.
    ///
    /// The returned iterator is lazy (pages are fetched on demand),
    /// finite, and restartable — call again for a fresh walk that sees
    /// records committed in the meantime.
    pub fn history_for_peer(&self, peer_id: &str) -> Result<PeerHistory, LedgerError> {
        validate_id(peer_id, "peer identifier must not be empty")?;

        Ok(PeerHistory {
            storage: self.storage.clone(),
            peer_id: peer_id.to_string(),
            page_size: self.page_size,
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: false,
        })
    }

    /// Counts recorded exchanges for a peer.
    pub fn count_for_peer(&self, peer_id: &str) -> Result<u64, LedgerError> {
        validate_id(peer_id, "peer identifier must not be empty")?;

        let store = self.storage.lock()?;
        Ok(store.count_history_for_peer(peer_id)?)
    }

    /// Deletes records older than the cutoff across all peers, for
    /// retention policies. Returns the number removed.
    ///
    /// Must not run concurrently with an active sync session; session
    /// gating lives in the engine layer, not here.
    pub fn purge_before(&self, cutoff: u64) -> Result<u64, LedgerError> {
        let store = self.storage.lock()?;
        Ok(store.purge_history_before(cutoff)?)
    }

    /// Deletes all records for one peer, for unpairing. Returns the
    /// number removed.
    pub fn clear_peer(&self, peer_id: &str) -> Result<u64, LedgerError> {
        validate_id(peer_id, "peer identifier must not be empty")?;

        let store = self.storage.lock()?;
        Ok(store.clear_history_for_peer(peer_id)?)
    }
}

/// Lazy, pagewise walk over one peer's recorded exchanges.
///
/// Yields records in (timestamp, insertion) order. The store lock is
/// held only while fetching a page, never across yielded items.
pub struct PeerHistory {
    storage: StorageHandle,
    peer_id: String,
    page_size: usize,
    cursor: Option<HistoryCursor>,
    buffer: VecDeque<(HistoryRecord, HistoryCursor)>,
    exhausted: bool,
}

impl PeerHistory {
    fn fetch_next_page(&mut self) -> Result<(), LedgerError> {
        let store = self.storage.lock()?;
        let page = store.history_page(&self.peer_id, self.cursor, self.page_size)?;

        if page.len() < self.page_size {
            self.exhausted = true;
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl Iterator for PeerHistory {
    type Item = Result<HistoryRecord, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_next_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }

        let (record, cursor) = self.buffer.pop_front()?;
        self.cursor = Some(cursor);
        Some(Ok(record))
    }
}

fn validate_id(value: &str, what: &'static str) -> Result<(), LedgerError> {
    if value.is_empty() {
        return Err(LedgerError::ConstraintViolation(what));
    }
    Ok(())
}

fn validate_record(record: &HistoryRecord) -> Result<(), LedgerError> {
    validate_id(&record.peer_id, "peer identifier must not be empty")?;
    validate_id(&record.content_id, "content identifier must not be empty")
}
