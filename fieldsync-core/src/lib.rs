//! FieldSync Core Library
//!
//! Peer-to-peer exchange history tracking and deduplication over a
//! passphrase-protected encrypted store.

pub mod api;
pub mod crypto;
pub mod ledger;
pub mod storage;
pub mod sync;

pub use api::{
    FieldSync, FieldSyncBuilder, FieldSyncConfig, FieldSyncError, FieldSyncResult,
};
pub use crypto::{decrypt, encrypt, SymmetricKey};
pub use ledger::{LedgerError, PeerHistory, ReceivedHistoryLedger};
pub use storage::{
    BatchCommit, Direction, HistoryCursor, HistoryRecord, Storage, StorageHandle, StorageProvider,
    StoreError,
};
pub use sync::{PeerSession, SessionError, SessionRegistry, SessionSummary};
