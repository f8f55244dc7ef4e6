use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The stream length at commit time did not match the caller's
    /// expectation. Nothing was appended.
    #[error(
        "Concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// A batch contained an event owned by another aggregate.
    #[error("Event {index} of the batch belongs to aggregate {found}, not {expected}")]
    InconsistentAggregateIds {
        expected: AggregateId,
        found: AggregateId,
        index: usize,
    },

    /// The backing store failed (unavailable, timed out, ...).
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EventStoreError {
    /// Returns true for an optimistic concurrency failure.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
