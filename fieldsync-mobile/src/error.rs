//! Mobile-friendly error types.

use fieldsync_core::api::FieldSyncError;
use fieldsync_core::ledger::LedgerError;
use fieldsync_core::storage::StoreError;
use fieldsync_core::sync::SessionError;

/// Mobile-friendly error type.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MobileError {
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Store not opened")]
    NotOpened,

    #[error("Exchange already recorded")]
    AlreadyRecorded,

    #[error("A sync session with this peer is already active: {0}")]
    PeerBusy(String),

    #[error("No active session with peer: {0}")]
    NoActiveSession(String),

    #[error("Refused while a sync session is active: {0}")]
    SessionActive(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for MobileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AuthenticationFailed => MobileError::AuthenticationFailed,
            StoreError::EmptyPassphrase => {
                MobileError::InvalidInput("passphrase must not be empty".to_string())
            }
            other => MobileError::StorageError(other.to_string()),
        }
    }
}

impl From<LedgerError> for MobileError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Store(e) => e.into(),
            LedgerError::DuplicateExchange => MobileError::AlreadyRecorded,
            LedgerError::ConstraintViolation(msg) => MobileError::InvalidInput(msg.to_string()),
        }
    }
}

impl From<SessionError> for MobileError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::PeerBusy(peer) => MobileError::PeerBusy(peer),
            SessionError::LockPoisoned => MobileError::Internal(err.to_string()),
            SessionError::Ledger(e) => e.into(),
        }
    }
}

impl From<FieldSyncError> for MobileError {
    fn from(err: FieldSyncError) -> Self {
        match err {
            FieldSyncError::Store(e) => e.into(),
            FieldSyncError::Ledger(e) => e.into(),
            FieldSyncError::Session(e) => e.into(),
            FieldSyncError::NotOpened => MobileError::NotOpened,
            FieldSyncError::SessionActive(what) => MobileError::SessionActive(what),
            FieldSyncError::Configuration(msg) => MobileError::InvalidInput(msg),
        }
    }
}
