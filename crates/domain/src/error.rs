//! Domain error types.

use common::{AggregateId, DomainEvent};
use event_store::{EventStoreError, Version};
use thiserror::Error;

use crate::aggregate::Aggregate;

/// Errors raised while folding a stream into an aggregate.
///
/// Both variants point at a programming or schema mistake rather than a
/// business rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// The stream holds a kind the aggregate has no apply behaviour for.
    #[error("{aggregate_type} has no apply behaviour for event {event_type}")]
    UnknownEventApplication {
        aggregate_type: &'static str,
        event_type: String,
    },

    /// A handler asked the loader for an aggregate other than the command's
    /// target.
    #[error("Cannot load aggregate {requested} while handling a command for {target}")]
    OutsideCommandScope {
        requested: AggregateId,
        target: AggregateId,
    },
}

impl ReplayError {
    /// Builds the error for an event `A` cannot fold.
    pub fn unknown_event<A: Aggregate>(event: &A::Event) -> Self {
        ReplayError::UnknownEventApplication {
            aggregate_type: A::aggregate_type(),
            event_type: event.event_type(),
        }
    }
}

/// Errors raised while building a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("A handler for {command_type} is already registered")]
    DuplicateHandler { command_type: &'static str },
}

/// Failure returned by a command handler.
#[derive(Debug, Error)]
pub enum HandlerError<X> {
    /// The command is not admissible in the aggregate's current state.
    #[error("{0}")]
    Domain(X),

    /// The loader could not rebuild the aggregate.
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Errors returned by [`Dispatcher::submit`](crate::Dispatcher::submit) and
/// [`Dispatcher::query_aggregate`](crate::Dispatcher::query_aggregate).
///
/// `X` is the domain error type shared by the registered handlers.
#[derive(Debug, Error)]
pub enum DispatchError<X> {
    /// No handler was registered for the submitted command type.
    #[error("No handler registered for command {command_type}")]
    NoHandlerRegistered { command_type: &'static str },

    /// The handler rejected the command. Nothing was persisted.
    #[error("Command rejected: {0}")]
    Domain(X),

    /// Another submission appended to the stream first. Nothing was
    /// persisted.
    #[error(
        "Concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// The stream could not be folded into the aggregate.
    #[error("Replay failed: {0}")]
    Replay(#[from] ReplayError),

    /// The event store failed for a reason other than a conflict.
    #[error("Event store error: {0}")]
    Store(#[source] EventStoreError),
}

impl<X> DispatchError<X> {
    /// Returns true for an optimistic concurrency failure.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DispatchError::ConcurrencyConflict { .. })
    }

    /// Returns the domain error, if the handler rejected the command.
    pub fn domain(&self) -> Option<&X> {
        match self {
            DispatchError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

impl<X> From<EventStoreError> for DispatchError<X> {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual,
            } => DispatchError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual,
            },
            other => DispatchError::Store(other),
        }
    }
}

impl<X> From<HandlerError<X>> for DispatchError<X> {
    fn from(err: HandlerError<X>) -> Self {
        match err {
            HandlerError::Domain(err) => DispatchError::Domain(err),
            HandlerError::Replay(err) => DispatchError::Replay(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CounterError;

    #[test]
    fn store_conflict_maps_to_conflict_variant() {
        let id = AggregateId::new();
        let err: DispatchError<CounterError> = EventStoreError::ConcurrencyConflict {
            aggregate_id: id,
            expected: Version::new(1),
            actual: Version::new(2),
        }
        .into();

        assert!(err.is_conflict());
        assert!(err.to_string().contains("expected version 1, found 2"));
    }

    #[test]
    fn other_store_failures_map_to_store_variant() {
        let err: DispatchError<CounterError> =
            EventStoreError::Backend("disk on fire".into()).into();

        assert!(matches!(err, DispatchError::Store(_)));
        assert!(!err.is_conflict());
    }

    #[test]
    fn handler_error_keeps_domain_error_verbatim() {
        let err: DispatchError<CounterError> =
            HandlerError::Domain(CounterError::NotOpen).into();

        assert_eq!(err.domain(), Some(&CounterError::NotOpen));
    }

    #[test]
    fn replay_errors_pass_through_handler_error() {
        let replay = ReplayError::OutsideCommandScope {
            requested: AggregateId::new(),
            target: AggregateId::new(),
        };
        let err: DispatchError<CounterError> = HandlerError::from(replay.clone()).into();

        assert!(matches!(err, DispatchError::Replay(ref inner) if *inner == replay));
    }
}
