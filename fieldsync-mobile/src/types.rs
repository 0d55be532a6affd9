//! Mobile-friendly data types.
//!
//! These types are wrappers around fieldsync-core types that are
//! compatible with UniFFI for cross-language bindings.

use fieldsync_core::{BatchCommit, Direction, HistoryRecord, SessionSummary};

/// Mobile-friendly exchange direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum MobileDirection {
    /// The unit was sent to the peer.
    Sent,
    /// The unit was received from the peer.
    Received,
}

impl From<Direction> for MobileDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Sent => MobileDirection::Sent,
            Direction::Received => MobileDirection::Received,
        }
    }
}

impl From<MobileDirection> for Direction {
    fn from(direction: MobileDirection) -> Self {
        match direction {
            MobileDirection::Sent => Direction::Sent,
            MobileDirection::Received => Direction::Received,
        }
    }
}

/// Mobile-friendly exchange history record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobileHistoryRecord {
    pub peer_id: String,
    pub content_id: String,
    pub direction: MobileDirection,
    pub timestamp: u64,
    pub payload_size: Option<u64>,
}

impl From<HistoryRecord> for MobileHistoryRecord {
    fn from(record: HistoryRecord) -> Self {
        MobileHistoryRecord {
            peer_id: record.peer_id,
            content_id: record.content_id,
            direction: record.direction.into(),
            timestamp: record.timestamp,
            payload_size: record.payload_size,
        }
    }
}

impl From<MobileHistoryRecord> for HistoryRecord {
    fn from(record: MobileHistoryRecord) -> Self {
        HistoryRecord {
            peer_id: record.peer_id,
            content_id: record.content_id,
            direction: record.direction.into(),
            timestamp: record.timestamp,
            payload_size: record.payload_size,
        }
    }
}

/// Counters for one sync session.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobileSessionSummary {
    pub sent: u64,
    pub received: u64,
    pub duplicates: u64,
}

impl From<SessionSummary> for MobileSessionSummary {
    fn from(summary: SessionSummary) -> Self {
        MobileSessionSummary {
            sent: summary.sent,
            received: summary.received,
            duplicates: summary.duplicates,
        }
    }
}

/// Outcome of a batch commit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobileBatchCommit {
    pub recorded: u64,
    pub duplicates: u64,
}

impl From<BatchCommit> for MobileBatchCommit {
    fn from(commit: BatchCommit) -> Self {
        MobileBatchCommit {
            recorded: commit.recorded,
            duplicates: commit.duplicates,
        }
    }
}
