//! Event log storage.
//!
//! Streams are append-only and keyed by [`AggregateId`]. Appends carry the
//! version the caller observed and fail with a concurrency conflict when the
//! stream moved on in the meantime.

pub mod error;
pub mod event;
pub mod memory;
pub mod store;

pub use common::{AggregateId, DomainEvent};
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventId, Version};
pub use memory::InMemoryEventStore;
pub use store::{EventStore, EventStoreExt, StreamSnapshot, validate_events_for_append};
