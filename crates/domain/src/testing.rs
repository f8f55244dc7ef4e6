//! A small counter domain shared by the unit tests.

use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use common::{AggregateId, DomainEvent};
use event_store::{EventEnvelope, Version};

use crate::{
    Aggregate, Command, CommandHandler, HandlerError, Loader, ReplayError, Subscriber,
    SubscriberError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterEventKind {
    Opened,
    Added,
    Archived,
}

impl fmt::Display for CounterEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CounterEventKind::Opened => "Opened",
            CounterEventKind::Added => "Added",
            CounterEventKind::Archived => "Archived",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CounterEvent {
    Opened { id: AggregateId },
    Added { id: AggregateId, amount: i64 },
    /// Counter has no apply behaviour for this one.
    Archived { id: AggregateId },
}

impl DomainEvent for CounterEvent {
    type Kind = CounterEventKind;

    fn kind(&self) -> CounterEventKind {
        match self {
            CounterEvent::Opened { .. } => CounterEventKind::Opened,
            CounterEvent::Added { .. } => CounterEventKind::Added,
            CounterEvent::Archived { .. } => CounterEventKind::Archived,
        }
    }

    fn aggregate_id(&self) -> AggregateId {
        match self {
            CounterEvent::Opened { id }
            | CounterEvent::Added { id, .. }
            | CounterEvent::Archived { id } => *id,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Counter {
    pub open: bool,
    pub total: i64,
    version: Version,
}

impl Aggregate for Counter {
    type Event = CounterEvent;

    fn aggregate_type() -> &'static str {
        "Counter"
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: &CounterEvent) -> Result<(), ReplayError> {
        match event {
            CounterEvent::Opened { .. } => self.open = true,
            CounterEvent::Added { amount, .. } => self.total += amount,
            CounterEvent::Archived { .. } => return Err(ReplayError::unknown_event::<Self>(event)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CounterError {
    #[error("Counter is not open")]
    NotOpen,
}

pub struct OpenCounter {
    pub id: AggregateId,
}

impl Command for OpenCounter {
    fn aggregate_id(&self) -> AggregateId {
        self.id
    }

    fn creates_aggregate(&self) -> bool {
        true
    }
}

pub struct AddToCounter {
    pub id: AggregateId,
    pub amount: i64,
}

impl Command for AddToCounter {
    fn aggregate_id(&self) -> AggregateId {
        self.id
    }
}

pub struct ArchiveCounter {
    pub id: AggregateId,
}

impl Command for ArchiveCounter {
    fn aggregate_id(&self) -> AggregateId {
        self.id
    }
}

/// Registered for no handler at all.
pub struct ResetCounter {
    pub id: AggregateId,
}

impl Command for ResetCounter {
    fn aggregate_id(&self) -> AggregateId {
        self.id
    }
}

pub struct OpenCounterHandler;

impl CommandHandler<OpenCounter> for OpenCounterHandler {
    type Aggregate = Counter;
    type Error = CounterError;

    fn handle(
        &self,
        _loader: &mut Loader<'_, Counter>,
        command: &OpenCounter,
    ) -> Result<Vec<CounterEvent>, HandlerError<CounterError>> {
        Ok(vec![CounterEvent::Opened { id: command.id }])
    }
}

pub struct AddToCounterHandler;

impl CommandHandler<AddToCounter> for AddToCounterHandler {
    type Aggregate = Counter;
    type Error = CounterError;

    fn handle(
        &self,
        loader: &mut Loader<'_, Counter>,
        command: &AddToCounter,
    ) -> Result<Vec<CounterEvent>, HandlerError<CounterError>> {
        let counter = loader.load(command.id)?;
        if !counter.open {
            return Err(HandlerError::Domain(CounterError::NotOpen));
        }
        if command.amount == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![CounterEvent::Added {
            id: command.id,
            amount: command.amount,
        }])
    }
}

pub struct ArchiveCounterHandler;

impl CommandHandler<ArchiveCounter> for ArchiveCounterHandler {
    type Aggregate = Counter;
    type Error = CounterError;

    fn handle(
        &self,
        _loader: &mut Loader<'_, Counter>,
        command: &ArchiveCounter,
    ) -> Result<Vec<CounterEvent>, HandlerError<CounterError>> {
        Ok(vec![CounterEvent::Archived { id: command.id }])
    }
}

/// Wraps events into envelopes at dense positions.
pub fn envelopes(events: Vec<CounterEvent>) -> Vec<EventEnvelope<CounterEvent>> {
    let recorded_at = Utc::now();
    events
        .into_iter()
        .enumerate()
        .map(|(position, event)| EventEnvelope::new(position as u64, recorded_at, event))
        .collect()
}

/// Records every envelope it receives.
#[derive(Default)]
pub struct Recorder {
    seen: Mutex<Vec<EventEnvelope<CounterEvent>>>,
}

impl Recorder {
    pub fn seen(&self) -> Vec<EventEnvelope<CounterEvent>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscriber<CounterEvent> for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn on_event(
        &self,
        envelope: &EventEnvelope<CounterEvent>,
    ) -> Result<(), SubscriberError> {
        // Give racing submissions a chance to interleave.
        tokio::task::yield_now().await;
        self.seen.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

/// Fails on every event.
pub struct Failing;

#[async_trait]
impl Subscriber<CounterEvent> for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn on_event(
        &self,
        _envelope: &EventEnvelope<CounterEvent>,
    ) -> Result<(), SubscriberError> {
        Err("read model unavailable".into())
    }
}

/// Panics on every event.
pub struct Panicking;

#[async_trait]
impl Subscriber<CounterEvent> for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn on_event(
        &self,
        _envelope: &EventEnvelope<CounterEvent>,
    ) -> Result<(), SubscriberError> {
        panic!("subscriber bug");
    }
}
