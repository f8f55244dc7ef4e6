//! Core aggregate trait.

use common::DomainEvent;
use event_store::Version;

use crate::error::ReplayError;

/// Trait for aggregates in an event-sourced system.
///
/// An aggregate holds exactly the state needed to decide whether a command
/// is admissible. It is never stored: every command and query rebuilds a
/// fresh instance by replaying the stream, uses it, and drops it.
///
/// `apply` must be deterministic. Two replays of the same stream have to
/// produce equal state.
pub trait Aggregate: Default + Send + Sync + 'static {
    /// The type of events this aggregate folds.
    type Event: DomainEvent;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the number of events folded into this instance.
    fn version(&self) -> Version;

    /// Sets the number of events folded into this instance.
    ///
    /// Called by [`replay`](crate::replay) once the stream is exhausted.
    fn set_version(&mut self, version: Version);

    /// Folds one event into the state.
    ///
    /// Kinds the aggregate has no behaviour for should be rejected with
    /// [`ReplayError::unknown_event`].
    fn apply(&mut self, event: &Self::Event) -> Result<(), ReplayError>;
}
