// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Configuration Types

use std::path::PathBuf;

use crate::ledger::DEFAULT_PAGE_SIZE;

/// Default file name for the encrypted store inside the data directory.
pub const DEFAULT_STORE_FILE: &str = "fieldsync.db";

/// Configuration for a [`FieldSync`](super::FieldSync) instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSyncConfig {
    /// Directory holding this installation's data. Created on open if
    /// it does not exist.
    pub data_dir: PathBuf,
    /// File name of the encrypted store inside `data_dir`.
    pub store_file_name: String,
    /// Records fetched per page when walking a peer's history.
    pub history_page_size: usize,
}

impl FieldSyncConfig {
    /// Creates a configuration rooted at the given data directory,
    /// with defaults for everything else.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        FieldSyncConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Full path of the encrypted store file.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file_name)
    }
}

impl Default for FieldSyncConfig {
    fn default() -> Self {
        FieldSyncConfig {
            data_dir: PathBuf::from("fieldsync-data"),
            store_file_name: DEFAULT_STORE_FILE.to_string(),
            history_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
