use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::{
    AggregateId, DomainEvent, EventEnvelope, EventStoreError, Result, Version,
    store::{EventStore, StreamSnapshot, validate_events_for_append},
};

type StreamCell<E> = Arc<ArcSwap<Vec<EventEnvelope<E>>>>;

/// In-memory event store.
///
/// Each stream lives behind an atomically swappable pointer to an immutable
/// vector. Readers take the current pointer and never block; writers build
/// a new vector and publish it with a compare-and-swap, starting over when
/// another writer got there first.
pub struct InMemoryEventStore<E> {
    streams: Arc<DashMap<AggregateId, StreamCell<E>>>,
}

impl<E> Clone for InMemoryEventStore<E> {
    fn clone(&self) -> Self {
        Self {
            streams: Arc::clone(&self.streams),
        }
    }
}

impl<E> Default for InMemoryEventStore<E> {
    fn default() -> Self {
        Self {
            streams: Arc::new(DashMap::new()),
        }
    }
}

impl<E: DomainEvent> InMemoryEventStore<E> {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored across all streams.
    pub fn event_count(&self) -> usize {
        self.streams
            .iter()
            .map(|entry| entry.value().load().len())
            .sum()
    }

    /// Returns the number of streams that hold at least one event.
    pub fn stream_count(&self) -> usize {
        self.streams
            .iter()
            .filter(|entry| !entry.value().load().is_empty())
            .count()
    }

    /// Returns the stream's cell, creating it only for a first append.
    ///
    /// Appends that cannot succeed never leave an empty cell behind.
    fn cell(&self, aggregate_id: AggregateId, expected: Version) -> Result<StreamCell<E>> {
        // Shard guards are dropped before the caller starts its CAS loop.
        if let Some(cell) = self.streams.get(&aggregate_id) {
            return Ok(Arc::clone(cell.value()));
        }
        if expected != Version::initial() {
            return Err(conflict(aggregate_id, expected, Version::initial()));
        }
        Ok(Arc::clone(
            self.streams
                .entry(aggregate_id)
                .or_insert_with(|| Arc::new(ArcSwap::from_pointee(Vec::new())))
                .value(),
        ))
    }
}

fn conflict(aggregate_id: AggregateId, expected: Version, actual: Version) -> EventStoreError {
    metrics::counter!("event_store_concurrency_conflicts").increment(1);
    tracing::debug!(%actual, "stale expected version");
    EventStoreError::ConcurrencyConflict {
        aggregate_id,
        expected,
        actual,
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for InMemoryEventStore<E> {
    async fn load_stream(&self, aggregate_id: AggregateId) -> Result<StreamSnapshot<E>> {
        Ok(self
            .streams
            .get(&aggregate_id)
            .map(|cell| cell.load_full())
            .unwrap_or_default())
    }

    #[tracing::instrument(skip(self, events), fields(batch = events.len()))]
    async fn append_events(
        &self,
        aggregate_id: AggregateId,
        expected: Version,
        events: Vec<E>,
    ) -> Result<Vec<EventEnvelope<E>>> {
        validate_events_for_append(aggregate_id, &events)?;
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let cell = self.cell(aggregate_id, expected)?;
        loop {
            let current = cell.load();
            let actual = Version::from_len(current.len());
            if actual != expected {
                return Err(conflict(aggregate_id, expected, actual));
            }

            let recorded_at = Utc::now();
            let committed: Vec<EventEnvelope<E>> = events
                .iter()
                .cloned()
                .enumerate()
                .map(|(offset, event)| {
                    EventEnvelope::new(actual.as_u64() + offset as u64, recorded_at, event)
                })
                .collect();

            let mut next = Vec::with_capacity(current.len() + committed.len());
            next.extend(current.iter().cloned());
            next.extend(committed.iter().cloned());

            let previous = cell.compare_and_swap(&*current, Arc::new(next));
            if Arc::ptr_eq(&*previous, &*current) {
                metrics::counter!("event_store_events_appended")
                    .increment(committed.len() as u64);
                tracing::debug!(version = %actual.advance(committed.len()), "events appended");
                return Ok(committed);
            }

            // Another writer swapped first; the next pass sees its events.
            metrics::counter!("event_store_cas_retries").increment(1);
        }
    }

    async fn stream_ids(&self) -> Result<Vec<AggregateId>> {
        let mut ids: Vec<AggregateId> = self
            .streams
            .iter()
            .filter(|entry| !entry.value().load().is_empty())
            .map(|entry| *entry.key())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
