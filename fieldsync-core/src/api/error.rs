// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Error Types
//!
//! Unified error type for the FieldSync API layer.

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::storage::StoreError;
use crate::sync::SessionError;

/// Unified error type for FieldSync operations.
#[derive(Error, Debug)]
pub enum FieldSyncError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Ledger operation failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Session operation failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The encrypted store has not been opened yet.
    #[error("store not opened")]
    NotOpened,

    /// Maintenance refused while a sync session is live.
    #[error("refused while a sync session is active: {0}")]
    SessionActive(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for FieldSync operations.
pub type FieldSyncResult<T> = Result<T, FieldSyncError>;
