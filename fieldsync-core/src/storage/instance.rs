// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Installation identity storage operations.

use rusqlite::params;
use tracing::debug;
use uuid::Uuid;

use super::{Storage, StoreError};

impl Storage {
    /// Returns this installation's instance key, generating one on first access.
    ///
    /// The instance key is the identifier this device advertises to peers.
    /// It is generated once per store and stable for the store's lifetime.
    /// It is not sensitive: peers see it in cleartext during every sync.
    pub fn instance_key(&self) -> Result<String, StoreError> {
        if let Some(existing) = self.load_instance_key()? {
            return Ok(existing);
        }

        let key = Uuid::new_v4().to_string();
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before UNIX epoch")
            .as_secs();

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO instance_info (id, instance_key, created_at)
             VALUES (1, ?1, ?2)",
            params![key, now as i64],
        )?;

        if inserted == 0 {
            // Another opener generated a key first; theirs is authoritative.
            return self.load_instance_key()?.ok_or_else(|| {
                StoreError::Integrity("instance_info row missing after concurrent creation".into())
            });
        }

        debug!(instance_key = %key, "generated instance key");
        Ok(key)
    }

    fn load_instance_key(&self) -> Result<Option<String>, StoreError> {
        let result = self.conn.query_row(
            "SELECT instance_key FROM instance_info WHERE id = 1",
            [],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(key) => Ok(Some(key)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }
}
