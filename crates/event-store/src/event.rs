use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AggregateId, DomainEvent};

/// Unique identifier for a committed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Length of a stream, used for optimistic concurrency control.
///
/// A stream that has never been written to is at version 0. Appending `n`
/// events to a stream at version `v` moves it to `v + n`, and the first of
/// those events sits at position `v`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Version of a stream with no events.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Version of a stream holding `len` events.
    pub fn from_len(len: usize) -> Self {
        Self(len as u64)
    }

    /// Returns the version after `count` more events.
    pub fn advance(&self, count: usize) -> Self {
        Self(self.0 + count as u64)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Version> for u64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A committed event together with the metadata the store assigned to it.
///
/// The metadata is informational; replay only looks at `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// The aggregate this event belongs to.
    pub aggregate_id: AggregateId,

    /// Zero-based position within the aggregate's stream.
    pub position: u64,

    /// When the store committed the event.
    pub recorded_at: DateTime<Utc>,

    /// The domain event itself.
    pub event: E,
}

impl<E: DomainEvent> EventEnvelope<E> {
    /// Wraps an event committed at `position`.
    pub fn new(position: u64, recorded_at: DateTime<Utc>, event: E) -> Self {
        Self {
            event_id: EventId::new(),
            aggregate_id: event.aggregate_id(),
            position,
            recorded_at,
            event,
        }
    }

    pub fn kind(&self) -> E::Kind {
        self.event.kind()
    }

    /// Stream version once this event is part of it.
    pub fn version(&self) -> Version {
        Version::new(self.position + 1)
    }
}
