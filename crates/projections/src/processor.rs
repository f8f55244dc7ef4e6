//! Projection processor for bootstrapping projections from the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use common::{AggregateId, DomainEvent};
use event_store::EventStore;
use tokio::sync::Mutex;

use crate::Result;
use crate::projection::Projection;

/// Replays stored events into projections.
///
/// The processor supports:
/// - Catch-up: delivers every stored event not yet delivered, stream by
///   stream in commit order, to each projection interested in its kind
/// - Rebuild: resets all projections and replays from scratch
///
/// Each projection keeps its own checkpoint per stream, so a projection that
/// fails mid-stream does not cause the others to see an event twice on the
/// next run.
///
/// Run catch-up before handing the projections to a dispatcher; events
/// committed after that point arrive through publication.
pub struct ProjectionProcessor<E: DomainEvent> {
    store: Arc<dyn EventStore<E>>,
    projections: Vec<Arc<dyn Projection<E>>>,
    // Events each projection has passed so far, keyed by (projection index, stream).
    checkpoints: Mutex<HashMap<(usize, AggregateId), usize>>,
}

impl<E: DomainEvent> ProjectionProcessor<E> {
    /// Creates a new processor with the given event store.
    pub fn new<S>(store: S) -> Self
    where
        S: EventStore<E> + 'static,
    {
        Self {
            store: Arc::new(store),
            projections: Vec::new(),
            checkpoints: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Arc<dyn Projection<E>>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Delivers stored events the processor has not delivered yet.
    ///
    /// Returns the number of stored events at least one projection had not
    /// yet passed. A failing projection stops the run at the event it failed
    /// on; the next run resumes each projection from its own checkpoint.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<u64> {
        let mut checkpoints = self.checkpoints.lock().await;
        let mut events_read: u64 = 0;

        for aggregate_id in self.store.stream_ids().await? {
            let stream = self.store.load_stream(aggregate_id).await?;
            let lowest = (0..self.projections.len())
                .map(|index| checkpoints.get(&(index, aggregate_id)).copied().unwrap_or(0))
                .min()
                .unwrap_or(stream.len());
            events_read += stream.len().saturating_sub(lowest) as u64;

            for (index, projection) in self.projections.iter().enumerate() {
                let interests: HashSet<E::Kind> = projection.interests().into_iter().collect();
                let done = checkpoints.entry((index, aggregate_id)).or_insert(0);

                for envelope in stream.iter().skip(*done) {
                    if interests.contains(&envelope.kind()) {
                        projection.handle(envelope).await?;
                        metrics::counter!("projections_events_processed").increment(1);
                    }
                    *done += 1;
                }
            }
        }

        tracing::info!(events_read, "catch-up complete");

        Ok(events_read)
    }

    /// Resets all projections and replays all events from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<u64> {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.checkpoints.lock().await.clear();
        self.run_catch_up().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionPosition;
    use async_trait::async_trait;
    use cafe::{CafeEvent, CafeEventKind, FoodOrdered, TabOpened};
    use domain::{Subscriber, SubscriberError};
    use event_store::{EventEnvelope, InMemoryEventStore, Version};
    use tokio::sync::RwLock;

    /// A simple counting projection for testing.
    struct CountingProjection {
        interests: Vec<CafeEventKind>,
        seen: Arc<RwLock<Vec<(AggregateId, u64)>>>,
        position: Arc<RwLock<ProjectionPosition>>,
    }

    impl CountingProjection {
        fn new(interests: Vec<CafeEventKind>) -> Self {
            Self {
                interests,
                seen: Arc::new(RwLock::new(Vec::new())),
                position: Arc::new(RwLock::new(ProjectionPosition::zero())),
            }
        }
    }

    #[async_trait]
    impl Subscriber<CafeEvent> for CountingProjection {
        fn name(&self) -> &str {
            "CountingProjection"
        }

        async fn on_event(
            &self,
            envelope: &EventEnvelope<CafeEvent>,
        ) -> std::result::Result<(), SubscriberError> {
            Ok(self.handle(envelope).await?)
        }
    }

    #[async_trait]
    impl Projection<CafeEvent> for CountingProjection {
        fn interests(&self) -> Vec<CafeEventKind> {
            self.interests.clone()
        }

        async fn handle(&self, envelope: &EventEnvelope<CafeEvent>) -> Result<()> {
            self.seen
                .write()
                .await
                .push((envelope.aggregate_id, envelope.position));
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            *self.position.read().await
        }

        async fn reset(&self) -> Result<()> {
            self.seen.write().await.clear();
            *self.position.write().await = ProjectionPosition::zero();
            Ok(())
        }
    }

    fn tab_events(id: AggregateId, food_orders: usize) -> Vec<CafeEvent> {
        let mut events: Vec<CafeEvent> = vec![
            TabOpened {
                id,
                table_number: 1,
                waiter: "Derek".to_string(),
            }
            .into(),
        ];
        events.extend((0..food_orders).map(|_| CafeEvent::from(FoodOrdered { id, items: vec![] })));
        events
    }

    async fn seeded_store(tabs: &[(AggregateId, usize)]) -> InMemoryEventStore<CafeEvent> {
        let store = InMemoryEventStore::new();
        for &(id, food_orders) in tabs {
            store
                .append_events(id, Version::initial(), tab_events(id, food_orders))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_catch_up_processes_all_events_in_stream_order() {
        let a = AggregateId::new();
        let b = AggregateId::new();
        let store = seeded_store(&[(a, 2), (b, 1)]).await;

        let projection = Arc::new(CountingProjection::new(CafeEventKind::ALL.to_vec()));
        let mut processor = ProjectionProcessor::new(store);
        processor.register(projection.clone());

        let read = processor.run_catch_up().await.unwrap();

        assert_eq!(read, 5);
        let seen = projection.seen.read().await.clone();
        assert_eq!(seen.len(), 5);
        let a_positions: Vec<u64> = seen
            .iter()
            .filter(|(id, _)| *id == a)
            .map(|(_, p)| *p)
            .collect();
        assert_eq!(a_positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_catch_up_respects_interests() {
        let id = AggregateId::new();
        let store = seeded_store(&[(id, 2)]).await;

        let kitchen = Arc::new(CountingProjection::new(vec![CafeEventKind::FoodOrdered]));
        let mut processor = ProjectionProcessor::new(store);
        processor.register(kitchen.clone());

        processor.run_catch_up().await.unwrap();

        assert_eq!(kitchen.position().await.events_processed, 2);
    }

    #[tokio::test]
    async fn test_catch_up_skips_already_processed() {
        let id = AggregateId::new();
        let store = seeded_store(&[(id, 2)]).await;

        let projection = Arc::new(CountingProjection::new(CafeEventKind::ALL.to_vec()));
        let mut processor = ProjectionProcessor::new(store.clone());
        processor.register(projection.clone());

        processor.run_catch_up().await.unwrap();
        assert_eq!(processor.run_catch_up().await.unwrap(), 0);
        assert_eq!(projection.seen.read().await.len(), 3);

        // Only the new event is delivered on the next run.
        store
            .append_events(id, Version::new(3), tab_events(id, 1).split_off(1))
            .await
            .unwrap();
        assert_eq!(processor.run_catch_up().await.unwrap(), 1);
        assert_eq!(projection.seen.read().await.len(), 4);
    }

    #[tokio::test]
    async fn test_rebuild_resets_and_replays() {
        let id = AggregateId::new();
        let store = seeded_store(&[(id, 1)]).await;

        let projection = Arc::new(CountingProjection::new(CafeEventKind::ALL.to_vec()));
        let mut processor = ProjectionProcessor::new(store);
        processor.register(projection.clone());

        processor.run_catch_up().await.unwrap();
        assert_eq!(projection.seen.read().await.len(), 2);

        processor.rebuild_all().await.unwrap();
        assert_eq!(projection.seen.read().await.len(), 2);
        assert_eq!(projection.position().await.events_processed, 2);
    }

    /// Fails the first event it is given, then succeeds.
    struct FlakyProjection {
        failed: std::sync::atomic::AtomicBool,
        handled: Arc<RwLock<u64>>,
    }

    #[async_trait]
    impl Subscriber<CafeEvent> for FlakyProjection {
        fn name(&self) -> &str {
            "FlakyProjection"
        }

        async fn on_event(
            &self,
            envelope: &EventEnvelope<CafeEvent>,
        ) -> std::result::Result<(), SubscriberError> {
            Ok(self.handle(envelope).await?)
        }
    }

    #[async_trait]
    impl Projection<CafeEvent> for FlakyProjection {
        fn interests(&self) -> Vec<CafeEventKind> {
            CafeEventKind::ALL.to_vec()
        }

        async fn handle(&self, envelope: &EventEnvelope<CafeEvent>) -> Result<()> {
            if !self.failed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(crate::ProjectionError::UnknownTab {
                    tab_id: envelope.aggregate_id,
                });
            }
            *self.handled.write().await += 1;
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            ProjectionPosition {
                events_processed: *self.handled.read().await,
            }
        }

        async fn reset(&self) -> Result<()> {
            *self.handled.write().await = 0;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_projection_does_not_replay_to_others() {
        let id = AggregateId::new();
        let store = seeded_store(&[(id, 0)]).await;

        let counting = Arc::new(CountingProjection::new(CafeEventKind::ALL.to_vec()));
        let flaky = Arc::new(FlakyProjection {
            failed: std::sync::atomic::AtomicBool::new(false),
            handled: Arc::new(RwLock::new(0)),
        });
        let mut processor = ProjectionProcessor::new(store);
        processor.register(counting.clone());
        processor.register(flaky.clone());

        assert!(processor.run_catch_up().await.is_err());
        assert_eq!(processor.run_catch_up().await.unwrap(), 1);

        assert_eq!(counting.seen.read().await.clone(), vec![(id, 0)]);
        assert_eq!(flaky.position().await.events_processed, 1);
        assert_eq!(processor.run_catch_up().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_store_catch_up() {
        let projection = Arc::new(CountingProjection::new(CafeEventKind::ALL.to_vec()));
        let mut processor = ProjectionProcessor::new(InMemoryEventStore::<CafeEvent>::new());
        processor.register(projection.clone());

        assert_eq!(processor.run_catch_up().await.unwrap(), 0);
        assert_eq!(projection.position().await, ProjectionPosition::zero());
        assert_eq!(processor.projection_count(), 1);
    }
}
