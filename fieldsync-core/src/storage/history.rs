// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Received history storage operations.
//!
//! Each row stores keyed digests for the indexable identity columns and
//! the full record as a sealed document. Reads unseal the document and
//! cross-check it against the plaintext columns, so a row whose digests,
//! direction or timestamp were edited on disk fails with an integrity
//! error instead of being served.

use std::collections::HashSet;

use rusqlite::params;
use tracing::{debug, info};

use crate::crypto::{self, digest_prefix};

use super::error::{BatchCommit, Direction, HistoryRecord};
use super::{Storage, StoreError};

/// Upper bound on placeholders per IN clause (SQLite's default
/// variable limit is 999).
const IN_CLAUSE_CHUNK: usize = 512;

/// Keyset cursor into a peer's history, ordered by (timestamp, id).
#[derive(Debug, Clone, Copy)]
pub struct HistoryCursor {
    pub timestamp: i64,
    pub id: i64,
}

impl Storage {
    // === Received History Operations ===

    /// Inserts one exchange record.
    ///
    /// Fails with `AlreadyExists` when the same (peer, content, direction)
    /// triple has been recorded before.
    pub fn insert_history(&self, record: &HistoryRecord) -> Result<(), StoreError> {
        let entry = self.entry_digest(&record.peer_id, &record.content_id, record.direction)?;
        let peer = self.peer_digest(&record.peer_id)?;
        let sealed = self.seal_record(record)?;

        let result = self.conn.execute(
            "INSERT INTO received_history
             (peer_digest, entry_digest, direction, timestamp, payload_size, record_sealed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                peer.as_slice(),
                entry.as_slice(),
                direction_to_str(record.direction),
                record.timestamp as i64,
                record.payload_size.map(|s| s as i64),
                sealed,
            ],
        );

        match result {
            Ok(_) => {
                debug!(entry = %digest_prefix(&entry), "recorded exchange");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::AlreadyExists(format!(
                    "exchange {}",
                    digest_prefix(&entry)
                )))
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Inserts a batch of exchange records in one transaction.
    ///
    /// Records whose triple already exists are counted as duplicates and
    /// skipped; the rest commit together. On error nothing is written.
    pub fn insert_history_batch(
        &self,
        records: &[HistoryRecord],
    ) -> Result<BatchCommit, StoreError> {
        if records.is_empty() {
            return Ok(BatchCommit::default());
        }

        // Seal and digest everything before the transaction starts.
        let mut prepared = Vec::with_capacity(records.len());
        for record in records {
            let entry = self.entry_digest(&record.peer_id, &record.content_id, record.direction)?;
            let peer = self.peer_digest(&record.peer_id)?;
            let sealed = self.seal_record(record)?;
            prepared.push((entry, peer, record, sealed));
        }

        let mut stmt = self.conn.prepare(
            "INSERT OR IGNORE INTO received_history
             (peer_digest, entry_digest, direction, timestamp, payload_size, record_sealed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        self.conn.execute_batch("BEGIN IMMEDIATE;")?;

        let mut commit = BatchCommit::default();
        for (entry, peer, record, sealed) in &prepared {
            let result = stmt.execute(params![
                peer.as_slice(),
                entry.as_slice(),
                direction_to_str(record.direction),
                record.timestamp as i64,
                record.payload_size.map(|s| s as i64),
                sealed,
            ]);

            match result {
                Ok(0) => commit.duplicates += 1,
                Ok(_) => commit.recorded += 1,
                Err(e) => {
                    self.conn.execute_batch("ROLLBACK;")?;
                    return Err(StoreError::Database(e));
                }
            }
        }

        self.conn.execute_batch("COMMIT;")?;

        debug!(
            recorded = commit.recorded,
            duplicates = commit.duplicates,
            "committed exchange batch"
        );
        Ok(commit)
    }

    /// Checks whether an exchange has been recorded.
    pub fn has_history_entry(
        &self,
        peer_id: &str,
        content_id: &str,
        direction: Direction,
    ) -> Result<bool, StoreError> {
        let entry = self.entry_digest(peer_id, content_id, direction)?;

        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM received_history WHERE entry_digest = ?1",
            params![entry.as_slice()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Returns the content ids with no existing exchange record, in
    /// first-occurrence order with duplicates collapsed.
    pub fn filter_unknown(
        &self,
        peer_id: &str,
        content_ids: &[String],
        direction: Direction,
    ) -> Result<Vec<String>, StoreError> {
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut candidates: Vec<(&String, [u8; 32])> = Vec::with_capacity(content_ids.len());
        for id in content_ids {
            if seen.insert(id.as_str()) {
                candidates.push((id, self.entry_digest(peer_id, id, direction)?));
            }
        }

        let mut known: HashSet<Vec<u8>> = HashSet::new();
        for chunk in candidates.chunks(IN_CLAUSE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT entry_digest FROM received_history WHERE entry_digest IN ({})",
                placeholders
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(chunk.iter().map(|(_, digest)| digest.to_vec())),
                |row| row.get::<_, Vec<u8>>(0),
            )?;
            for row in rows {
                known.insert(row?);
            }
        }

        Ok(candidates
            .into_iter()
            .filter(|(_, digest)| !known.contains(digest.as_slice()))
            .map(|(id, _)| id.clone())
            .collect())
    }

    /// Fetches one page of a peer's history after the given cursor,
    /// ordered by (timestamp, id).
    pub fn history_page(
        &self,
        peer_id: &str,
        after: Option<HistoryCursor>,
        limit: usize,
    ) -> Result<Vec<(HistoryRecord, HistoryCursor)>, StoreError> {
        let peer = self.peer_digest(peer_id)?;

        let rows: Vec<HistoryRow> = match after {
            Some(cursor) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, peer_digest, entry_digest, direction, timestamp, payload_size, record_sealed
                     FROM received_history
                     WHERE peer_digest = ?1
                       AND (timestamp > ?2 OR (timestamp = ?2 AND id > ?3))
                     ORDER BY timestamp, id
                     LIMIT ?4",
                )?;
                let mapped = stmt.query_map(
                    params![peer.as_slice(), cursor.timestamp, cursor.id, limit as i64],
                    row_to_history_row,
                )?;
                mapped
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(StoreError::Database)?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, peer_digest, entry_digest, direction, timestamp, payload_size, record_sealed
                     FROM received_history
                     WHERE peer_digest = ?1
                     ORDER BY timestamp, id
                     LIMIT ?2",
                )?;
                let mapped =
                    stmt.query_map(params![peer.as_slice(), limit as i64], row_to_history_row)?;
                mapped
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(StoreError::Database)?
            }
        };

        let mut page = Vec::with_capacity(rows.len());
        for row in rows {
            let cursor = HistoryCursor {
                timestamp: row.timestamp,
                id: row.id,
            };
            let record = self.open_row(row)?;
            page.push((record, cursor));
        }
        Ok(page)
    }

    /// Counts recorded exchanges for a peer.
    pub fn count_history_for_peer(&self, peer_id: &str) -> Result<u64, StoreError> {
        let peer = self.peer_digest(peer_id)?;

        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM received_history WHERE peer_digest = ?1",
            params![peer.as_slice()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Deletes all records older than the cutoff, across all peers.
    /// Returns the number of records removed.
    pub fn purge_history_before(&self, cutoff: u64) -> Result<u64, StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM received_history WHERE timestamp < ?1",
            params![cutoff as i64],
        )?;

        if removed > 0 {
            info!(removed, cutoff, "purged history before cutoff");
        }
        Ok(removed as u64)
    }

    /// Deletes all records for one peer. Returns the number removed.
    pub fn clear_history_for_peer(&self, peer_id: &str) -> Result<u64, StoreError> {
        let peer = self.peer_digest(peer_id)?;

        let removed = self.conn.execute(
            "DELETE FROM received_history WHERE peer_digest = ?1",
            params![peer.as_slice()],
        )?;

        if removed > 0 {
            info!(peer = %digest_prefix(&peer), removed, "cleared peer history");
        }
        Ok(removed as u64)
    }

    // === Sealing & Digest Helpers ===

    /// Keyed digest of one (peer, content, direction) triple.
    fn entry_digest(
        &self,
        peer_id: &str,
        content_id: &str,
        direction: Direction,
    ) -> Result<[u8; 32], StoreError> {
        let encoded =
            bincode::serialize(&("entry", peer_id, content_id, direction_to_str(direction)))
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(self.keys.lookup.digest(&encoded))
    }

    /// Keyed digest of a peer identifier.
    fn peer_digest(&self, peer_id: &str) -> Result<[u8; 32], StoreError> {
        let encoded = bincode::serialize(&("peer", peer_id))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(self.keys.lookup.digest(&encoded))
    }

    fn seal_record(&self, record: &HistoryRecord) -> Result<Vec<u8>, StoreError> {
        let json =
            serde_json::to_vec(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        crypto::encrypt(&self.keys.sealing, &json)
            .map_err(|e| StoreError::Encryption(e.to_string()))
    }

    /// Unseals a record document. The key is already verified at open,
    /// so a failure here means the row was altered on disk.
    fn unseal_record(&self, sealed: &[u8]) -> Result<HistoryRecord, StoreError> {
        let json = crypto::decrypt(&self.keys.sealing, sealed)
            .map_err(|_| StoreError::Integrity("sealed record does not open under the store key".into()))?;
        serde_json::from_slice(&json).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Unseals a row and cross-checks the sealed record against the
    /// plaintext columns it was indexed under.
    fn open_row(&self, row: HistoryRow) -> Result<HistoryRecord, StoreError> {
        let record = self.unseal_record(&row.record_sealed)?;

        let expect_entry =
            self.entry_digest(&record.peer_id, &record.content_id, record.direction)?;
        let expect_peer = self.peer_digest(&record.peer_id)?;

        let consistent = row.entry_digest.as_slice() == expect_entry.as_slice()
            && row.peer_digest.as_slice() == expect_peer.as_slice()
            && direction_from_str(&row.direction) == Some(record.direction)
            && row.timestamp == record.timestamp as i64
            && row.payload_size == record.payload_size.map(|s| s as i64);

        if !consistent {
            return Err(StoreError::Integrity(format!(
                "history row {} does not match its sealed record",
                row.id
            )));
        }
        Ok(record)
    }
}

/// Raw row as stored, before unsealing.
struct HistoryRow {
    id: i64,
    peer_digest: Vec<u8>,
    entry_digest: Vec<u8>,
    direction: String,
    timestamp: i64,
    payload_size: Option<i64>,
    record_sealed: Vec<u8>,
}

/// Converts Direction to database representation.
fn direction_to_str(direction: Direction) -> &'static str {
    match direction {
        Direction::Sent => "sent",
        Direction::Received => "received",
    }
}

/// Parses the database direction representation.
fn direction_from_str(s: &str) -> Option<Direction> {
    match s {
        "sent" => Some(Direction::Sent),
        "received" => Some(Direction::Received),
        _ => None,
    }
}

/// Converts database row to HistoryRow.
fn row_to_history_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryRow> {
    Ok(HistoryRow {
        id: row.get(0)?,
        peer_digest: row.get(1)?,
        entry_digest: row.get(2)?,
        direction: row.get(3)?,
        timestamp: row.get(4)?,
        payload_size: row.get(5)?,
        record_sealed: row.get(6)?,
    })
}
