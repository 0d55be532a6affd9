// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! FieldSync API Layer
//!
//! High-level API for the FieldSync exchange-history library.
//!
//! # Overview
//!
//! The API layer provides a clean, easy-to-use interface that coordinates:
//! - Encrypted store lifecycle (passphrase-gated, opened once)
//! - Exchange history queries and commits
//! - Per-peer sync sessions
//! - Retention maintenance
//!
//! # Example
//!
//! ```ignore
//! use fieldsync_core::api::{FieldSync, FieldSyncConfig};
//! use fieldsync_core::storage::Direction;
//!
//! // Open the store for this installation
//! let fs = FieldSync::new(FieldSyncConfig::new("/data/fieldsync"))?;
//! fs.open("correct horse battery staple")?;
//!
//! // Ask which offered records are new before transferring
//! let ledger = fs.ledger()?;
//! let wanted = ledger.filter_unknown("peer-42", &offered, Direction::Received)?;
//! println!("{} of {} records are new", wanted.len(), offered.len());
//! ```
//!
//! # Module Structure
//!
//! - [`error`] - Error types for the API layer
//! - [`config`] - Configuration types
//! - [`fieldsync`] - Main FieldSync orchestrator

#[cfg(feature = "testing")]
pub mod config;
#[cfg(not(feature = "testing"))]
mod config;

#[cfg(feature = "testing")]
pub mod error;
#[cfg(not(feature = "testing"))]
mod error;

#[cfg(feature = "testing")]
pub mod fieldsync;
#[cfg(not(feature = "testing"))]
mod fieldsync;

// Error types
pub use error::{FieldSyncError, FieldSyncResult};

// Configuration
pub use config::{FieldSyncConfig, DEFAULT_STORE_FILE};

// FieldSync
pub use fieldsync::{FieldSync, FieldSyncBuilder};
