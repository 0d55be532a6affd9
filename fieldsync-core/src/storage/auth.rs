// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Passphrase Bootstrap
//!
//! Binds a store file to the passphrase it was created with. A single
//! `store_auth` row holds the KDF salt and a sealed canary; the first
//! open writes it, every later open must unseal it. An unseal failure
//! reports `AuthenticationFailed` — AEAD cannot tell a wrong key from
//! damaged canary bytes, and treating both as bad credentials keeps a
//! wrong passphrase from ever reading sealed rows.
//!
//! The table is created outside the migration framework: it must be
//! readable before the store's keys exist, and migrations only run
//! once the passphrase has been verified.

use ring::rand::{SecureRandom, SystemRandom};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::crypto::{self, derive_key_argon2id, SymmetricKey};

use super::StoreError;

/// Fixed plaintext sealed into the canary column at store creation.
const CANARY: &[u8] = b"fieldsync-store-v1";

/// Salt length for the passphrase KDF.
const SALT_LEN: usize = 16;

/// Verifies the passphrase against the store, creating the bootstrap
/// row on first open. Returns the derived master key.
pub(crate) fn authenticate(
    conn: &Connection,
    passphrase: &str,
) -> Result<SymmetricKey, StoreError> {
    if passphrase.is_empty() {
        return Err(StoreError::EmptyPassphrase);
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS store_auth (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            kdf_salt BLOB NOT NULL,
            canary_sealed BLOB NOT NULL,
            created_at INTEGER NOT NULL
        );",
    )?;

    if let Some((salt, sealed)) = load_bootstrap(conn)? {
        return verify(passphrase, &salt, &sealed);
    }
    initialize(conn, passphrase)
}

/// Creates the bootstrap row with a fresh random salt.
fn initialize(conn: &Connection, passphrase: &str) -> Result<SymmetricKey, StoreError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| StoreError::Encryption("Salt generation failed".into()))?;

    let master = derive_key_argon2id(passphrase.as_bytes(), &salt)
        .map_err(|e| StoreError::Encryption(e.to_string()))?;
    let sealed = crypto::encrypt(&master, CANARY)
        .map_err(|e| StoreError::Encryption(e.to_string()))?;

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before UNIX epoch")
        .as_secs();

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO store_auth (id, kdf_salt, canary_sealed, created_at)
         VALUES (1, ?1, ?2, ?3)",
        rusqlite::params![salt.as_slice(), sealed, now as i64],
    )?;

    if inserted == 0 {
        // Another opener created the row between our read and write.
        // Their salt is authoritative; verify against it.
        let (salt, sealed) = load_bootstrap(conn)?.ok_or_else(|| {
            StoreError::Integrity("store_auth row missing after concurrent initialization".into())
        })?;
        return verify(passphrase, &salt, &sealed);
    }

    debug!("store auth bootstrap created");
    Ok(master)
}

/// Derives the master key and checks it against the sealed canary.
fn verify(passphrase: &str, salt: &[u8], canary_sealed: &[u8]) -> Result<SymmetricKey, StoreError> {
    let master = derive_key_argon2id(passphrase.as_bytes(), salt)
        .map_err(|e| StoreError::Encryption(e.to_string()))?;

    match crypto::decrypt(&master, canary_sealed) {
        Ok(plain) if plain == CANARY => Ok(master),
        _ => {
            warn!("passphrase verification failed");
            Err(StoreError::AuthenticationFailed)
        }
    }
}

/// Reads the bootstrap row, or `None` if the store is fresh.
fn load_bootstrap(conn: &Connection) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
    match conn.query_row(
        "SELECT kdf_salt, canary_sealed FROM store_auth WHERE id = 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    ) {
        Ok(pair) => Ok(Some(pair)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StoreError::Database(e)),
    }
}
