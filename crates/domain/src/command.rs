//! Command handling infrastructure.

use common::AggregateId;
use event_store::EventEnvelope;

use crate::{
    aggregate::Aggregate,
    error::{HandlerError, ReplayError},
    replay::replay,
};

/// Trait for commands that can be submitted to the dispatcher.
///
/// Commands represent an intention to change one aggregate. They may be
/// rejected if the aggregate's current state doesn't allow the action, and
/// they are never persisted.
pub trait Command: Send + Sync + 'static {
    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> AggregateId;

    /// Returns true when the command brings a new aggregate into existence.
    ///
    /// The dispatcher skips loading for such commands and appends against an
    /// empty stream, so a reused identifier fails with a conflict.
    fn creates_aggregate(&self) -> bool {
        false
    }

    /// Returns the command type name, used in logs and metrics.
    fn command_type(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

/// Last path segment of a type's name.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

/// Decides which events a command produces.
///
/// Handlers are pure: the same aggregate state and command always yield the
/// same events or the same error. Returning an empty list is valid and means
/// nothing is appended or published.
pub trait CommandHandler<C: Command>: Send + Sync + 'static {
    /// The aggregate the command targets.
    type Aggregate: Aggregate;

    /// The domain error reported when the command is not admissible.
    type Error: Send + Sync + 'static;

    fn handle(
        &self,
        loader: &mut Loader<'_, Self::Aggregate>,
        command: &C,
    ) -> Result<Vec<<Self::Aggregate as Aggregate>::Event>, HandlerError<Self::Error>>;
}

/// Rebuilds the command's target aggregate on demand.
///
/// The dispatcher fetches the target stream once, before the handler runs.
/// Every call to [`Loader::load`] replays that same stream into a fresh
/// instance; requests for any other identifier are refused.
pub struct Loader<'a, A: Aggregate> {
    target: AggregateId,
    stream: &'a [EventEnvelope<A::Event>],
    loads: usize,
}

impl<'a, A: Aggregate> Loader<'a, A> {
    pub fn new(target: AggregateId, stream: &'a [EventEnvelope<A::Event>]) -> Self {
        Self {
            target,
            stream,
            loads: 0,
        }
    }

    /// Returns the identifier this loader is scoped to.
    pub fn target(&self) -> AggregateId {
        self.target
    }

    /// Replays the target stream into a fresh aggregate.
    pub fn load(&mut self, aggregate_id: AggregateId) -> Result<A, ReplayError> {
        self.loads += 1;
        if aggregate_id != self.target {
            return Err(ReplayError::OutsideCommandScope {
                requested: aggregate_id,
                target: self.target,
            });
        }
        replay(self.stream)
    }

    /// Number of times [`Loader::load`] was called.
    pub fn load_count(&self) -> usize {
        self.loads
    }
}
