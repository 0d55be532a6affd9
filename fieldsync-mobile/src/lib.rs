//! FieldSync Mobile Bindings
//!
//! UniFFI bindings for Android and iOS platforms.
//! Exposes a simplified, mobile-friendly API on top of fieldsync-core.
//!
//! Note: history queries are materialized into vectors here; lazy
//! iterators do not cross the FFI boundary.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fieldsync_core::api::{FieldSync, FieldSyncConfig};
use fieldsync_core::ledger::LedgerError;
use fieldsync_core::sync::PeerSession;
use fieldsync_core::{Direction, HistoryRecord};

// === Modules ===

mod error;
mod types;

// Re-export public types
pub use error::MobileError;
pub use types::{MobileBatchCommit, MobileDirection, MobileHistoryRecord, MobileSessionSummary};

uniffi::setup_scaffolding!();

// === Passphrase Strength ===

/// Passphrase strength level for display to users.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum MobilePassphraseStrength {
    /// Score 0-1: Too weak to use
    TooWeak,
    /// Score 2: Fair but not recommended
    Fair,
    /// Score 3: Strong enough
    Strong,
    /// Score 4: Very strong
    VeryStrong,
}

/// Result of passphrase strength check.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobilePassphraseCheck {
    /// The strength level
    pub strength: MobilePassphraseStrength,
    /// Human-readable description
    pub description: String,
    /// Feedback/suggestions for improvement (empty if strong enough)
    pub feedback: String,
    /// Whether the passphrase is acceptable for protecting the store
    pub is_acceptable: bool,
}

/// Check passphrase strength before opening a store with it.
///
/// Returns strength level, description, and feedback for improvement.
#[uniffi::export]
pub fn check_passphrase_strength(passphrase: String) -> MobilePassphraseCheck {
    // Short passphrases get immediate feedback
    if passphrase.len() < 8 {
        return MobilePassphraseCheck {
            strength: MobilePassphraseStrength::TooWeak,
            description: "Too short".to_string(),
            feedback: "Passphrase must be at least 8 characters".to_string(),
            is_acceptable: false,
        };
    }

    let estimate = zxcvbn::zxcvbn(&passphrase, &[]);
    let (strength, description, is_acceptable) = match estimate.score() {
        zxcvbn::Score::Zero | zxcvbn::Score::One => {
            (MobilePassphraseStrength::TooWeak, "Too weak", false)
        }
        zxcvbn::Score::Two => (MobilePassphraseStrength::Fair, "Fair", false),
        zxcvbn::Score::Three => (MobilePassphraseStrength::Strong, "Strong", true),
        _ => (MobilePassphraseStrength::VeryStrong, "Very strong", true),
    };

    let feedback = if is_acceptable {
        String::new()
    } else {
        estimate
            .feedback()
            .map(|f| {
                f.suggestions()
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Add more words or use a longer passphrase".to_string())
    };

    MobilePassphraseCheck {
        strength,
        description: description.to_string(),
        feedback,
        is_acceptable,
    }
}

// === Main Interface ===

/// Main FieldSync interface for mobile platforms.
///
/// Sessions started over FFI are keyed by peer id and live until
/// `end_sync_session` (or this object) drops them.
#[derive(uniffi::Object)]
pub struct FieldSyncMobile {
    engine: FieldSync,
    sessions: Mutex<HashMap<String, PeerSession>>,
}

impl FieldSyncMobile {
    /// Runs a closure against the live session for a peer.
    fn with_session<R>(
        &self,
        peer_id: &str,
        f: impl FnOnce(&mut PeerSession) -> Result<R, MobileError>,
    ) -> Result<R, MobileError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(peer_id)
            .ok_or_else(|| MobileError::NoActiveSession(peer_id.to_string()))?;
        f(session)
    }

    fn record(
        &self,
        peer_id: String,
        content_id: String,
        direction: Direction,
        timestamp: u64,
        payload_size: Option<u64>,
    ) -> Result<bool, MobileError> {
        let record = HistoryRecord {
            peer_id,
            content_id,
            direction,
            timestamp,
            payload_size,
        };

        match self.engine.ledger()?.record_exchange(&record) {
            Ok(()) => Ok(true),
            Err(LedgerError::DuplicateExchange) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[uniffi::export]
impl FieldSyncMobile {
    /// Create a new FieldSyncMobile instance.
    ///
    /// Opens (creating on first use) the encrypted store under
    /// `data_dir`. The platform should:
    /// 1. Collect the store passphrase from the user
    /// 2. Check it with `check_passphrase_strength` on first setup
    /// 3. Pass it here on every launch
    #[uniffi::constructor]
    pub fn new(data_dir: String, passphrase: String) -> Result<Arc<Self>, MobileError> {
        let engine = FieldSync::new(FieldSyncConfig::new(&data_dir))?;
        engine.open(&passphrase)?;

        Ok(Arc::new(FieldSyncMobile {
            engine,
            sessions: Mutex::new(HashMap::new()),
        }))
    }

    /// The stable identifier this installation advertises to peers.
    pub fn instance_key(&self) -> Result<String, MobileError> {
        Ok(self.engine.instance_key()?)
    }

    // === History Queries ===

    /// Check whether a unit of content has already been exchanged with a peer.
    pub fn has_exchanged(
        &self,
        peer_id: String,
        content_id: String,
        direction: MobileDirection,
    ) -> Result<bool, MobileError> {
        Ok(self
            .engine
            .ledger()?
            .has_exchanged(&peer_id, &content_id, direction.into())?)
    }

    /// Filter a batch of content ids down to the ones not yet exchanged
    /// with the peer, preserving first-occurrence order.
    pub fn filter_unknown(
        &self,
        peer_id: String,
        content_ids: Vec<String>,
        direction: MobileDirection,
    ) -> Result<Vec<String>, MobileError> {
        Ok(self
            .engine
            .ledger()?
            .filter_unknown(&peer_id, &content_ids, direction.into())?)
    }

    /// Everything exchanged with a peer, oldest first.
    pub fn history_for_peer(
        &self,
        peer_id: String,
    ) -> Result<Vec<MobileHistoryRecord>, MobileError> {
        let history = self.engine.ledger()?.history_for_peer(&peer_id)?;

        let mut records = Vec::new();
        for record in history {
            records.push(MobileHistoryRecord::from(record?));
        }
        Ok(records)
    }

    /// Number of records exchanged with a peer.
    pub fn peer_record_count(&self, peer_id: String) -> Result<u64, MobileError> {
        Ok(self.engine.ledger()?.count_for_peer(&peer_id)?)
    }

    // === Recording ===

    /// Record one completed exchange.
    ///
    /// Returns true if the exchange was newly recorded, false if it
    /// was already on file.
    pub fn record_exchange(
        &self,
        peer_id: String,
        content_id: String,
        direction: MobileDirection,
        timestamp: u64,
    ) -> Result<bool, MobileError> {
        self.record(peer_id, content_id, direction.into(), timestamp, None)
    }

    /// Record one completed exchange with its payload size in bytes.
    pub fn record_exchange_sized(
        &self,
        peer_id: String,
        content_id: String,
        direction: MobileDirection,
        timestamp: u64,
        payload_size: u64,
    ) -> Result<bool, MobileError> {
        self.record(
            peer_id,
            content_id,
            direction.into(),
            timestamp,
            Some(payload_size),
        )
    }

    /// Record a batch of completed exchanges in one transaction.
    pub fn record_all(
        &self,
        records: Vec<MobileHistoryRecord>,
    ) -> Result<MobileBatchCommit, MobileError> {
        let records: Vec<HistoryRecord> = records.into_iter().map(HistoryRecord::from).collect();
        Ok(self.engine.ledger()?.record_all(&records)?.into())
    }

    // === Sync Sessions ===

    /// Start a sync session with a peer.
    ///
    /// Fails with `PeerBusy` while another session with the same peer
    /// is live.
    pub fn begin_sync_session(&self, peer_id: String) -> Result<(), MobileError> {
        let session = self.engine.begin_session(&peer_id)?;
        self.sessions.lock().unwrap().insert(peer_id, session);
        Ok(())
    }

    /// Confirm one unit sent to the peer during its live session.
    ///
    /// Returns true if newly recorded, false if already on file.
    pub fn confirm_sent(
        &self,
        peer_id: String,
        content_id: String,
        timestamp: u64,
        payload_size: Option<u64>,
    ) -> Result<bool, MobileError> {
        self.with_session(&peer_id, |session| {
            Ok(session.confirm_sent(&content_id, timestamp, payload_size)?)
        })
    }

    /// Confirm one unit received from the peer during its live session.
    pub fn confirm_received(
        &self,
        peer_id: String,
        content_id: String,
        timestamp: u64,
        payload_size: Option<u64>,
    ) -> Result<bool, MobileError> {
        self.with_session(&peer_id, |session| {
            Ok(session.confirm_received(&content_id, timestamp, payload_size)?)
        })
    }

    /// Counters for a live session.
    pub fn session_summary(&self, peer_id: String) -> Result<MobileSessionSummary, MobileError> {
        self.with_session(&peer_id, |session| Ok(session.summary().into()))
    }

    /// End a session, releasing the peer for future sessions.
    ///
    /// Returns the final counters.
    pub fn end_sync_session(&self, peer_id: String) -> Result<MobileSessionSummary, MobileError> {
        let session = self
            .sessions
            .lock()
            .unwrap()
            .remove(&peer_id)
            .ok_or_else(|| MobileError::NoActiveSession(peer_id.clone()))?;

        let summary = session.summary();
        drop(session);
        Ok(summary.into())
    }

    // === Maintenance ===

    /// Delete all records older than the cutoff timestamp, across all
    /// peers. Refused while any sync session is live.
    pub fn purge_before(&self, cutoff: u64) -> Result<u64, MobileError> {
        Ok(self.engine.purge_before(cutoff)?)
    }

    /// Delete all records for one peer. Refused while that peer's
    /// session is live.
    pub fn clear_peer_history(&self, peer_id: String) -> Result<u64, MobileError> {
        Ok(self.engine.clear_peer_history(&peer_id)?)
    }
}
