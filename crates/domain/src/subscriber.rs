//! Consumers of published events.

use async_trait::async_trait;
use common::DomainEvent;
use event_store::EventEnvelope;

/// Error type subscribers report back to the dispatcher.
///
/// The dispatcher logs and counts it; it never reaches the command's caller.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

/// Receives committed events after they are appended.
///
/// The dispatcher calls `on_event` once per committed event of a kind the
/// subscriber was registered for, in each aggregate's commit order.
/// Subscribers guard their own state.
///
/// `on_event` runs while the aggregate's commit lane is held. Submitting a
/// command for the same aggregate from inside it never completes; commands
/// for other aggregates are fine.
#[async_trait]
pub trait Subscriber<E: DomainEvent>: Send + Sync {
    /// Returns the subscriber name, used in logs and metrics.
    fn name(&self) -> &str;

    async fn on_event(&self, envelope: &EventEnvelope<E>) -> Result<(), SubscriberError>;
}
