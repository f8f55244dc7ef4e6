use std::sync::Arc;

use async_trait::async_trait;

use crate::{AggregateId, DomainEvent, EventEnvelope, EventStoreError, Result, Version};

/// An immutable view of one stream at the moment it was loaded.
///
/// Later appends never change a snapshot that has already been handed out.
pub type StreamSnapshot<E> = Arc<Vec<EventEnvelope<E>>>;

/// Core trait for event log backends.
///
/// Any backend honouring this contract (in-memory, SQL, a remote log) can be
/// swapped in without touching the dispatcher or the command handlers.
#[async_trait]
pub trait EventStore<E: DomainEvent>: Send + Sync {
    /// Loads every event of a stream, oldest first.
    ///
    /// An identifier that was never written to yields an empty snapshot.
    async fn load_stream(&self, aggregate_id: AggregateId) -> Result<StreamSnapshot<E>>;

    /// Appends `events` to the stream if its length is still `expected`.
    ///
    /// The check and the append form one atomic step per identifier: either
    /// every event becomes visible to later loads or none does. A stale
    /// `expected` fails with [`EventStoreError::ConcurrencyConflict`]. Events
    /// owned by another identifier fail with
    /// [`EventStoreError::InconsistentAggregateIds`] before anything is
    /// touched. An empty batch is a no-op.
    ///
    /// Returns the committed envelopes.
    async fn append_events(
        &self,
        aggregate_id: AggregateId,
        expected: Version,
        events: Vec<E>,
    ) -> Result<Vec<EventEnvelope<E>>>;

    /// Lists identifiers that own at least one event.
    async fn stream_ids(&self) -> Result<Vec<AggregateId>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt<E: DomainEvent>: EventStore<E> {
    /// Returns the current length of a stream.
    async fn stream_version(&self, aggregate_id: AggregateId) -> Result<Version> {
        Ok(Version::from_len(self.load_stream(aggregate_id).await?.len()))
    }

    /// Checks if a stream has any events.
    async fn stream_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.stream_version(aggregate_id).await? != Version::initial())
    }
}

impl<E: DomainEvent, T: EventStore<E> + ?Sized> EventStoreExt<E> for T {}

/// Checks that every event in a batch is owned by `aggregate_id`.
///
/// Backends call this before touching storage so that an inconsistent batch
/// never results in a partial write.
pub fn validate_events_for_append<E: DomainEvent>(
    aggregate_id: AggregateId,
    events: &[E],
) -> Result<()> {
    match events
        .iter()
        .position(|event| event.aggregate_id() != aggregate_id)
    {
        Some(index) => Err(EventStoreError::InconsistentAggregateIds {
            expected: aggregate_id,
            found: events[index].aggregate_id(),
            index,
        }),
        None => Ok(()),
    }
}
