// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Database Schema Migration Framework
//!
//! Provides versioned schema migrations with transactional safety.
//! Each migration has a version number, name, and a SQL script. The
//! runner tracks applied versions in a `schema_version` table and runs
//! pending migrations in order within a single transaction.

use rusqlite::Connection;

use super::StoreError;

/// A single schema migration step.
pub struct Migration {
    /// Monotonically increasing version number (starting at 1).
    pub version: u32,
    /// Human-readable name for this migration.
    pub name: &'static str,
    /// SQL script applied by this migration.
    pub sql: &'static str,
}

/// Runs schema migrations against a database connection.
pub struct MigrationRunner;

impl MigrationRunner {
    /// Runs all pending migrations in a transaction.
    ///
    /// Creates the `schema_version` table if it doesn't exist, then applies
    /// any migrations whose version is greater than the current schema version.
    /// All pending migrations run within a single transaction — if any migration
    /// fails, all changes are rolled back.
    pub fn run(conn: &Connection, migrations: &[Migration]) -> Result<(), StoreError> {
        // Create the schema_version table if it doesn't exist (outside transaction,
        // since we need to read it before starting the migration transaction).
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );",
        )?;

        let current_version = Self::current_version(conn)?;

        // Collect pending migrations
        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > current_version)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        // Verify migrations are in order
        for window in pending.windows(2) {
            if window[0].version >= window[1].version {
                return Err(StoreError::Migration(format!(
                    "Migrations are not in order: v{} before v{}",
                    window[0].version, window[1].version
                )));
            }
        }

        // Run all pending migrations in a single transaction
        conn.execute_batch("BEGIN EXCLUSIVE TRANSACTION;")?;

        for migration in &pending {
            if let Err(e) = conn.execute_batch(migration.sql) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StoreError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e
                )));
            }

            // Record this migration
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("system time before UNIX epoch")
                .as_secs();

            if let Err(e) = conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, now as i64],
            ) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StoreError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e
                )));
            }
        }

        conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    /// Returns the current schema version, or 0 if no migrations have been applied.
    pub fn current_version(conn: &Connection) -> Result<u32, StoreError> {
        // Check if schema_version table exists
        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap_or(None);

        Ok(version.unwrap_or(0))
    }
}

/// Returns all registered migrations in version order.
///
/// This is the single source of truth for the database schema.
/// New migrations are appended to the end of this list.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "received_history_baseline",
            sql: MIGRATION_V1_BASELINE,
        },
        Migration {
            version: 2,
            name: "retention_purge_index",
            sql: MIGRATION_V2_RETENTION_INDEX,
        },
    ]
}

/// Migration v1: Baseline schema.
///
/// The history table is append-only: rows are inserted when an exchange
/// completes and removed only by retention purges. Identifier columns
/// hold keyed digests, never plaintext ids; the full record lives in
/// the sealed document column.
const MIGRATION_V1_BASELINE: &str = "
    -- Completed exchanges, one row per (peer, content, direction) triple
    CREATE TABLE IF NOT EXISTS received_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        peer_digest BLOB NOT NULL,
        entry_digest BLOB NOT NULL,
        direction TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        payload_size INTEGER,
        record_sealed BLOB NOT NULL
    );

    -- Dedup probe and duplicate rejection
    CREATE UNIQUE INDEX IF NOT EXISTS idx_history_entry ON received_history(entry_digest);

    -- Per-peer history walks in (timestamp, id) order
    CREATE INDEX IF NOT EXISTS idx_history_peer_time ON received_history(peer_digest, timestamp, id);

    -- Installation identity (advertised to peers)
    CREATE TABLE IF NOT EXISTS instance_info (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        instance_key TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
";

/// Migration v2: Index for retention purges by cutoff timestamp.
const MIGRATION_V2_RETENTION_INDEX: &str = "
    CREATE INDEX IF NOT EXISTS idx_history_timestamp ON received_history(timestamp);
";
