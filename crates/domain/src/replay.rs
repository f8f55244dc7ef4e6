//! Rebuilding aggregate state from a stream.

use event_store::{EventEnvelope, Version};

use crate::{aggregate::Aggregate, error::ReplayError};

/// Folds `stream` into a fresh aggregate, oldest event first.
///
/// The returned aggregate's version is the number of events folded. Only the
/// events themselves are consulted; envelope metadata is ignored.
pub fn replay<A: Aggregate>(stream: &[EventEnvelope<A::Event>]) -> Result<A, ReplayError> {
    let mut aggregate = A::default();
    for envelope in stream {
        aggregate.apply(&envelope.event)?;
    }
    aggregate.set_version(Version::from_len(stream.len()));
    Ok(aggregate)
}
