// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.
//! Import these in property test files to avoid duplication.

use proptest::prelude::*;

use fieldsync_core::{Direction, HistoryRecord};

/// Strategy for generating peer identifiers.
pub fn peer_id_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{16,64}"
}

/// Strategy for generating content identifiers.
pub fn content_id_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{8,64}"
}

/// Strategy for generating a batch of distinct content ids.
pub fn content_id_set_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(content_id_strategy(), 1..=max)
        .prop_map(|set| set.into_iter().collect())
}

/// Strategy for generating timestamps (reasonable Unix epoch range).
pub fn timestamp_strategy() -> impl Strategy<Value = u64> {
    1000000000u64..2000000000u64
}

/// Strategy for generating exchange directions.
pub fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Received), Just(Direction::Sent)]
}

/// Strategy for generating optional payload sizes.
pub fn payload_size_strategy() -> impl Strategy<Value = Option<u64>> {
    prop::option::of(1u64..10_000_000u64)
}

/// Strategy for generating a full history record bound to one peer.
pub fn history_record_strategy(peer_id: String) -> impl Strategy<Value = HistoryRecord> {
    (
        content_id_strategy(),
        direction_strategy(),
        timestamp_strategy(),
        payload_size_strategy(),
    )
        .prop_map(move |(content_id, direction, timestamp, payload_size)| HistoryRecord {
            peer_id: peer_id.clone(),
            content_id,
            direction,
            timestamp,
            payload_size,
        })
}
