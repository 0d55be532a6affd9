// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! Provides the encrypted local store behind the received-history ledger.
//! Uses SQLite with application-level encryption: record documents are
//! sealed with XChaCha20-Poly1305 and identifier columns hold keyed
//! digests, so the database file exposes neither peer nor content ids.

#[cfg(feature = "testing")]
pub mod auth;
#[cfg(not(feature = "testing"))]
mod auth;

#[cfg(feature = "testing")]
pub mod error;
#[cfg(not(feature = "testing"))]
mod error;

#[cfg(feature = "testing")]
pub mod history;
#[cfg(not(feature = "testing"))]
mod history;

#[cfg(feature = "testing")]
pub mod instance;
#[cfg(not(feature = "testing"))]
mod instance;

pub mod migration;

pub use error::{BatchCommit, Direction, HistoryRecord, StoreError};
pub use history::HistoryCursor;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::OnceCell;
use rusqlite::Connection;
use tracing::info;

use crate::crypto::{LookupKey, SymmetricKey, HKDF};

/// KDF info constants for domain separation.
const SEALING_KEY_INFO: &[u8] = b"FieldSync_Record_Sealing";
const LOOKUP_KEY_INFO: &[u8] = b"FieldSync_Lookup_Digest";

/// Subkeys derived from the store master key.
///
/// Sealing and lookup are independent keys: compromising the digest of
/// an identifier must not help open sealed record documents.
pub(crate) struct StoreKeys {
    pub(crate) sealing: SymmetricKey,
    pub(crate) lookup: LookupKey,
}

impl StoreKeys {
    fn derive(master: &SymmetricKey) -> StoreKeys {
        let sealing = HKDF::derive_key(None, master.as_bytes(), SEALING_KEY_INFO);
        let lookup = HKDF::derive_key(None, master.as_bytes(), LOOKUP_KEY_INFO);
        StoreKeys {
            sealing: SymmetricKey::from_bytes(sealing),
            lookup: LookupKey::from_bytes(lookup),
        }
    }
}

/// SQLite-based storage implementation.
///
/// Opening verifies the passphrase against the store's bootstrap row
/// before anything else touches the file; a wrong passphrase surfaces
/// as `AuthenticationFailed` and never reads or writes sealed rows.
pub struct Storage {
    conn: Connection,
    /// Subkeys derived from the passphrase master key.
    pub(crate) keys: StoreKeys,
}

impl Storage {
    /// Opens or creates a store database at the given path.
    pub fn open<P: AsRef<Path>>(path: P, passphrase: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::bootstrap(conn, passphrase)
    }

    /// Creates an in-memory store (for testing).
    pub fn in_memory(passphrase: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn, passphrase)
    }

    /// Authenticates the passphrase, derives subkeys and migrates the schema.
    fn bootstrap(conn: Connection, passphrase: &str) -> Result<Self, StoreError> {
        let master = auth::authenticate(&conn, passphrase)?;
        let storage = Storage {
            conn,
            keys: StoreKeys::derive(&master),
        };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Runs all pending schema migrations.
    fn run_migrations(&self) -> Result<(), StoreError> {
        let migrations = migration::all_migrations();
        migration::MigrationRunner::run(&self.conn, &migrations)
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StoreError> {
        migration::MigrationRunner::current_version(&self.conn)
    }
}

/// Shared handle to one open store.
///
/// `Connection` is not `Sync`, so the store sits behind a mutex and
/// every operation goes through [`StorageHandle::lock`].
#[derive(Clone)]
pub struct StorageHandle {
    inner: Arc<Mutex<Storage>>,
}

impl StorageHandle {
    fn new(storage: Storage) -> Self {
        StorageHandle {
            inner: Arc::new(Mutex::new(storage)),
        }
    }

    /// Locks the store for one operation.
    pub fn lock(&self) -> Result<MutexGuard<'_, Storage>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

/// One-time store initialization.
///
/// The first successful `open` creates the store; every later call
/// returns the same handle without re-deriving keys or touching the
/// disk, regardless of the passphrase argument (first passphrase wins
/// for the provider's lifetime). Concurrent first calls are serialized
/// so exactly one store is created; a failed first open leaves the
/// provider empty, so a corrected passphrase can try again.
pub struct StorageProvider {
    cell: OnceCell<StorageHandle>,
}

impl StorageProvider {
    /// Creates a provider with no store opened yet.
    pub fn new() -> Self {
        StorageProvider {
            cell: OnceCell::new(),
        }
    }

    /// Opens the store at `path` on first call; afterwards returns the
    /// cached handle. `path` and `passphrase` are ignored once a store
    /// is open.
    pub fn open<P: AsRef<Path>>(
        &self,
        path: P,
        passphrase: &str,
    ) -> Result<StorageHandle, StoreError> {
        let handle = self.cell.get_or_try_init(|| {
            let storage = Storage::open(path, passphrase)?;
            info!("encrypted store opened");
            Ok::<_, StoreError>(StorageHandle::new(storage))
        })?;
        Ok(handle.clone())
    }

    /// Same as [`StorageProvider::open`], backed by an in-memory
    /// database (for testing).
    pub fn open_in_memory(&self, passphrase: &str) -> Result<StorageHandle, StoreError> {
        let handle = self.cell.get_or_try_init(|| {
            Ok::<_, StoreError>(StorageHandle::new(Storage::in_memory(passphrase)?))
        })?;
        Ok(handle.clone())
    }

    /// Returns the handle if the store has been opened.
    pub fn get(&self) -> Option<StorageHandle> {
        self.cell.get().cloned()
    }
}

impl Default for StorageProvider {
    fn default() -> Self {
        Self::new()
    }
}
