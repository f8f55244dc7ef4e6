//! Identifier and event contracts shared by every layer of the runtime.

mod event;
mod types;

pub use event::DomainEvent;
pub use types::AggregateId;
