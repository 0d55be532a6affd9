// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! FieldSync Orchestrator
//!
//! Main entry point for the FieldSync API.

use std::path::PathBuf;

use once_cell::sync::OnceCell;

use crate::ledger::ReceivedHistoryLedger;
use crate::storage::{StorageHandle, StorageProvider};
use crate::sync::{PeerSession, SessionRegistry};

use super::config::FieldSyncConfig;
use super::error::{FieldSyncError, FieldSyncResult};

/// Main FieldSync orchestrator.
///
/// This is the primary entry point for using FieldSync. It owns the
/// encrypted store and the per-peer session registry, and coordinates:
/// - Store lifecycle (open once, shared handle afterwards)
/// - Exchange history queries and commits
/// - Per-peer sync sessions
/// - Retention maintenance
///
/// # Example
///
/// ```ignore
/// use fieldsync_core::api::{FieldSync, FieldSyncConfig};
///
/// let fs = FieldSync::new(FieldSyncConfig::new("/data/fieldsync"))?;
/// fs.open("correct horse battery staple")?;
///
/// let mut session = fs.begin_session("peer-42")?;
/// let wanted = session.filter_unknown(&offered, Direction::Received)?;
/// for content_id in wanted {
///     // ... transfer ...
///     session.confirm_received(&content_id, now, None)?;
/// }
/// drop(session);
/// ```
pub struct FieldSync {
    config: FieldSyncConfig,
    provider: StorageProvider,
    registry: OnceCell<SessionRegistry>,
}

impl FieldSync {
    /// Creates a new FieldSync instance. The store stays closed until
    /// [`FieldSync::open`] is called with a passphrase.
    pub fn new(config: FieldSyncConfig) -> FieldSyncResult<Self> {
        if config.store_file_name.is_empty() {
            return Err(FieldSyncError::Configuration(
                "store file name must not be empty".into(),
            ));
        }
        if config.history_page_size == 0 {
            return Err(FieldSyncError::Configuration(
                "history page size must be at least 1".into(),
            ));
        }

        Ok(FieldSync {
            config,
            provider: StorageProvider::new(),
            registry: OnceCell::new(),
        })
    }

    /// Creates a FieldSync instance backed by an in-memory store
    /// (for testing). The store is opened immediately.
    pub fn in_memory(passphrase: &str) -> FieldSyncResult<Self> {
        let fieldsync = FieldSync::new(FieldSyncConfig::default())?;
        fieldsync.open_in_memory(passphrase)?;
        Ok(fieldsync)
    }

    // === Store Lifecycle ===

    /// Opens the encrypted store with the given passphrase, creating
    /// it on first use.
    ///
    /// The first successful open binds the store for the lifetime of
    /// this instance; later calls return the same handle without
    /// re-checking the passphrase.
    pub fn open(&self, passphrase: &str) -> FieldSyncResult<StorageHandle> {
        std::fs::create_dir_all(&self.config.data_dir)
            .map_err(|e| FieldSyncError::Configuration(e.to_string()))?;

        let handle = self.provider.open(self.config.storage_path(), passphrase)?;
        self.init_registry(&handle);
        Ok(handle)
    }

    /// Opens an in-memory store instead of a file-backed one.
    pub fn open_in_memory(&self, passphrase: &str) -> FieldSyncResult<StorageHandle> {
        let handle = self.provider.open_in_memory(passphrase)?;
        self.init_registry(&handle);
        Ok(handle)
    }

    /// Returns true once the store has been opened.
    pub fn is_open(&self) -> bool {
        self.provider.get().is_some()
    }

    /// The configuration this instance was created with.
    pub fn config(&self) -> &FieldSyncConfig {
        &self.config
    }

    fn init_registry(&self, handle: &StorageHandle) {
        self.registry
            .get_or_init(|| SessionRegistry::new(self.ledger_over(handle.clone())));
    }

    fn ledger_over(&self, handle: StorageHandle) -> ReceivedHistoryLedger {
        ReceivedHistoryLedger::with_page_size(handle, self.config.history_page_size)
    }

    fn handle(&self) -> FieldSyncResult<StorageHandle> {
        self.provider.get().ok_or(FieldSyncError::NotOpened)
    }

    fn sessions(&self) -> FieldSyncResult<&SessionRegistry> {
        self.registry.get().ok_or(FieldSyncError::NotOpened)
    }

    // === Ledger Access ===

    /// Returns a ledger over the open store.
    ///
    /// Ledgers are cheap handles; calling this repeatedly is fine.
    pub fn ledger(&self) -> FieldSyncResult<ReceivedHistoryLedger> {
        Ok(self.ledger_over(self.handle()?))
    }

    // === Sync Sessions ===

    /// Starts a sync session with a peer.
    ///
    /// At most one session per peer may be live; a second attempt
    /// fails with [`SessionError::PeerBusy`](crate::sync::SessionError).
    pub fn begin_session(&self, peer_id: &str) -> FieldSyncResult<PeerSession> {
        Ok(self.sessions()?.begin(peer_id)?)
    }

    /// Returns true while a session with this peer is live.
    pub fn session_active(&self, peer_id: &str) -> FieldSyncResult<bool> {
        Ok(self.sessions()?.is_active(peer_id)?)
    }

    // === Maintenance ===

    /// Deletes all exchange records older than the cutoff timestamp,
    /// across all peers. Returns the number of records removed.
    ///
    /// Refused while any sync session is live: a purge racing a
    /// session could delete records the session just wrote.
    pub fn purge_before(&self, cutoff: u64) -> FieldSyncResult<u64> {
        let sessions = self.sessions()?;
        let live = sessions.active_count()?;
        if live > 0 {
            return Err(FieldSyncError::SessionActive(format!(
                "{live} live session(s)"
            )));
        }

        Ok(self.ledger()?.purge_before(cutoff)?)
    }

    /// Deletes all exchange records for one peer. Returns the number
    /// of records removed.
    ///
    /// Refused while that peer's session is live; sessions with other
    /// peers do not block it.
    pub fn clear_peer_history(&self, peer_id: &str) -> FieldSyncResult<u64> {
        if self.sessions()?.is_active(peer_id)? {
            return Err(FieldSyncError::SessionActive(peer_id.to_string()));
        }

        Ok(self.ledger()?.clear_peer(peer_id)?)
    }

    // === Instance Identity ===

    /// The stable identifier this installation advertises to peers.
    ///
    /// Generated on first access and persisted in the store.
    pub fn instance_key(&self) -> FieldSyncResult<String> {
        let handle = self.handle()?;
        let key = handle.lock()?.instance_key()?;
        Ok(key)
    }
}

/// Builder for creating FieldSync instances.
pub struct FieldSyncBuilder {
    config: FieldSyncConfig,
}

impl FieldSyncBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        FieldSyncBuilder {
            config: FieldSyncConfig::default(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: FieldSyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the data directory.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Sets the store file name inside the data directory.
    pub fn store_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.store_file_name = name.into();
        self
    }

    /// Sets the history page size.
    pub fn history_page_size(mut self, size: usize) -> Self {
        self.config.history_page_size = size;
        self
    }

    /// Builds the FieldSync instance.
    pub fn build(self) -> FieldSyncResult<FieldSync> {
        FieldSync::new(self.config)
    }
}

impl Default for FieldSyncBuilder {
    fn default() -> Self {
        Self::new()
    }
}
