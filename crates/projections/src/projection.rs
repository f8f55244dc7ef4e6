//! Core projection trait and position tracking.

use std::sync::Arc;

use async_trait::async_trait;
use common::DomainEvent;
use domain::{DispatcherBuilder, Subscriber};
use event_store::EventEnvelope;

use crate::Result;

/// Tracks how many events a projection has processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events processed by this projection.
    pub events_processed: u64,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self {
            events_processed: 0,
        }
    }

    /// Advances the position by one event.
    pub fn advance(&self) -> Self {
        Self {
            events_processed: self.events_processed + 1,
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// A subscriber that folds events into a queryable read model.
///
/// Projections receive live events from the dispatcher through
/// [`Subscriber::on_event`] and historical ones from the
/// [`ProjectionProcessor`](crate::ProjectionProcessor) through
/// [`Projection::handle`]. Both paths must produce the same state.
#[async_trait]
pub trait Projection<E: DomainEvent>: Subscriber<E> {
    /// Event kinds this projection reacts to.
    fn interests(&self) -> Vec<E::Kind>;

    /// Handles a single event, updating the read model.
    async fn handle(&self, envelope: &EventEnvelope<E>) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}

/// Subscribes `projection` to the event kinds it is interested in.
pub fn subscribe_projection<E, X, P>(
    builder: DispatcherBuilder<E, X>,
    projection: Arc<P>,
) -> DispatcherBuilder<E, X>
where
    E: DomainEvent,
    X: Send + Sync + 'static,
    P: Projection<E> + 'static,
{
    let interests = projection.interests();
    builder.subscribe(interests, projection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_starts_at_zero() {
        let pos = ProjectionPosition::zero();
        assert_eq!(pos.events_processed, 0);
    }

    #[test]
    fn position_advances() {
        let pos = ProjectionPosition::zero();
        let pos = pos.advance();
        assert_eq!(pos.events_processed, 1);
        let pos = pos.advance();
        assert_eq!(pos.events_processed, 2);
    }

    #[test]
    fn position_display() {
        let pos = ProjectionPosition {
            events_processed: 42,
        };
        assert_eq!(pos.to_string(), "position(42)");
    }
}
