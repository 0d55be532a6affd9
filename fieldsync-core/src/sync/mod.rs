// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Session Tracking
//!
//! At most one sync session per remote peer may be live at a time: a
//! purge or a second transfer racing a session could skip or delete
//! records the session relies on. The registry hands out one
//! [`PeerSession`] per peer; the session releases its slot on drop, so
//! an aborted transfer (peer walked away, thread panicked) never
//! leaves the peer locked out.
//!
//! Sessions commit exchanges one at a time, in transfer-completion
//! order. A crash mid-session therefore leaves a clean prefix of the
//! transferred units recorded and nothing else.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::debug;

use crate::ledger::{LedgerError, PeerHistory, ReceivedHistoryLedger};
use crate::storage::{Direction, HistoryRecord};

/// Session error types.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A sync session with peer {0} is already active")]
    PeerBusy(String),

    #[error("Session registry lock poisoned by a panicked thread")]
    LockPoisoned,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Counters for one sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    /// Units newly recorded as sent to the peer.
    pub sent: u64,
    /// Units newly recorded as received from the peer.
    pub received: u64,
    /// Confirmations that found the exchange already recorded.
    pub duplicates: u64,
}

/// Hands out per-peer sync sessions, one live session per peer.
#[derive(Clone)]
pub struct SessionRegistry {
    ledger: ReceivedHistoryLedger,
    active: Arc<Mutex<HashSet<String>>>,
}

impl SessionRegistry {
    /// Creates a registry over the given ledger.
    pub fn new(ledger: ReceivedHistoryLedger) -> Self {
        SessionRegistry {
            ledger,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Starts a session with a peer.
    ///
    /// Fails with [`SessionError::PeerBusy`] while another session with
    /// the same peer is live. Sessions with distinct peers may run
    /// concurrently.
    pub fn begin(&self, peer_id: &str) -> Result<PeerSession, SessionError> {
        if peer_id.is_empty() {
            return Err(
                LedgerError::ConstraintViolation("peer identifier must not be empty").into(),
            );
        }

        {
            let mut active = self.active.lock().map_err(|_| SessionError::LockPoisoned)?;
            if !active.insert(peer_id.to_string()) {
                return Err(SessionError::PeerBusy(peer_id.to_string()));
            }
        }

        debug!("sync session started");
        Ok(PeerSession {
            ledger: self.ledger.clone(),
            registry: Arc::clone(&self.active),
            peer_id: peer_id.to_string(),
            summary: SessionSummary::default(),
        })
    }

    /// Returns true while a session with this peer is live.
    pub fn is_active(&self, peer_id: &str) -> Result<bool, SessionError> {
        let active = self.active.lock().map_err(|_| SessionError::LockPoisoned)?;
        Ok(active.contains(peer_id))
    }

    /// Number of currently live sessions.
    pub fn active_count(&self) -> Result<usize, SessionError> {
        let active = self.active.lock().map_err(|_| SessionError::LockPoisoned)?;
        Ok(active.len())
    }
}

/// One live sync session with a peer.
///
/// Holds the peer's exclusivity slot for its lifetime and releases it
/// on drop. Commits go through [`PeerSession::confirm_sent`] and
/// [`PeerSession::confirm_received`] in the order the corresponding
/// transfers complete.
pub struct PeerSession {
    ledger: ReceivedHistoryLedger,
    registry: Arc<Mutex<HashSet<String>>>,
    peer_id: String,
    summary: SessionSummary,
}

impl PeerSession {
    /// The peer this session is bound to.
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Returns true iff this unit was already exchanged with the peer.
    pub fn already_exchanged(
        &self,
        content_id: &str,
        direction: Direction,
    ) -> Result<bool, SessionError> {
        Ok(self
            .ledger
            .has_exchanged(&self.peer_id, content_id, direction)?)
    }

    /// Filters a batch down to the units not yet exchanged with the peer.
    pub fn filter_unknown(
        &self,
        content_ids: &[String],
        direction: Direction,
    ) -> Result<Vec<String>, SessionError> {
        Ok(self
            .ledger
            .filter_unknown(&self.peer_id, content_ids, direction)?)
    }

    /// Confirms one unit sent to the peer.
    ///
    /// Returns true if the exchange was newly recorded, false if it
    /// was already on file. Finding it on file is success: a session
    /// retried after partial failure hits this on every unit the
    /// previous attempt committed.
    pub fn confirm_sent(
        &mut self,
        content_id: &str,
        timestamp: u64,
        payload_size: Option<u64>,
    ) -> Result<bool, SessionError> {
        let newly_recorded = self.confirm(content_id, Direction::Sent, timestamp, payload_size)?;
        if newly_recorded {
            self.summary.sent += 1;
        }
        Ok(newly_recorded)
    }

    /// Confirms one unit received from the peer.
    ///
    /// Same duplicate tolerance as [`PeerSession::confirm_sent`].
    pub fn confirm_received(
        &mut self,
        content_id: &str,
        timestamp: u64,
        payload_size: Option<u64>,
    ) -> Result<bool, SessionError> {
        let newly_recorded = self.confirm(content_id, Direction::Received, timestamp, payload_size)?;
        if newly_recorded {
            self.summary.received += 1;
        }
        Ok(newly_recorded)
    }

    fn confirm(
        &mut self,
        content_id: &str,
        direction: Direction,
        timestamp: u64,
        payload_size: Option<u64>,
    ) -> Result<bool, SessionError> {
        let record = HistoryRecord {
            peer_id: self.peer_id.clone(),
            content_id: content_id.to_string(),
            direction,
            timestamp,
            payload_size,
        };

        match self.ledger.record_exchange(&record) {
            Ok(()) => Ok(true),
            Err(LedgerError::DuplicateExchange) => {
                self.summary.duplicates += 1;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Everything exchanged with this peer so far, oldest first.
    pub fn history(&self) -> Result<PeerHistory, SessionError> {
        Ok(self.ledger.history_for_peer(&self.peer_id)?)
    }

    /// Counters for this session so far.
    pub fn summary(&self) -> SessionSummary {
        self.summary
    }
}

impl Drop for PeerSession {
    fn drop(&mut self) {
        // The slot must come off even if the registry mutex was
        // poisoned by another session thread.
        let mut active = match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        active.remove(&self.peer_id);
        drop(active);

        debug!(
            sent = self.summary.sent,
            received = self.summary.received,
            duplicates = self.summary.duplicates,
            "sync session ended"
        );
    }
}
