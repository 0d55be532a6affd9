//! Storage error types and shared history record types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Passphrase does not match this store")]
    AuthenticationFailed,

    #[error("Passphrase must not be empty")]
    EmptyPassphrase,

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Record integrity check failed: {0}")]
    Integrity(String),

    #[error("Storage lock poisoned by a panicked thread")]
    LockPoisoned,
}

/// Transfer direction of a recorded exchange, from this device's
/// point of view.
///
/// The same content id can legitimately appear once per direction:
/// receiving a unit and later sending it back are separate events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Sent to the peer.
    Sent,
    /// Received from the peer.
    Received,
}

/// One completed exchange of a content unit with a peer.
///
/// This is both the input to a commit and the unit returned by history
/// queries. At rest the whole struct is sealed into an encrypted
/// document; only the digest columns and operational metadata
/// (timestamp, direction, payload size) are visible to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Stable identifier of the peer device.
    pub peer_id: String,
    /// Identifier of the exchanged unit of data.
    pub content_id: String,
    /// Whether the unit was sent or received.
    pub direction: Direction,
    /// When the exchange completed (Unix seconds, caller-supplied).
    pub timestamp: u64,
    /// Size of the transferred payload in bytes, when known.
    pub payload_size: Option<u64>,
}

/// Outcome of a batch commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchCommit {
    /// Records newly written by this batch.
    pub recorded: u64,
    /// Records skipped because an identical exchange was already present.
    pub duplicates: u64,
}
