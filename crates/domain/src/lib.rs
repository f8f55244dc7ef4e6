//! Domain layer for the event-sourcing runtime.
//!
//! This crate provides:
//! - the [`Aggregate`] trait and [`replay`], which fold a stream into state
//! - [`Command`] and [`CommandHandler`], which turn a command into events
//! - the [`Dispatcher`], which routes commands, persists their events with
//!   optimistic concurrency and publishes them to [`Subscriber`]s

pub mod aggregate;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod replay;
pub mod subscriber;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::Aggregate;
pub use command::{Command, CommandHandler, Loader};
pub use common::{AggregateId, DomainEvent};
pub use dispatcher::{Committed, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::{DispatchError, HandlerError, RegistrationError, ReplayError};
pub use replay::replay;
pub use subscriber::{Subscriber, SubscriberError};
