//! Command routing, persistence and event publication.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use common::{AggregateId, DomainEvent};
use dashmap::DashMap;
use event_store::{EventEnvelope, EventStore, EventStoreError, StreamSnapshot, Version};
use futures_util::FutureExt;
use tokio::sync::Mutex;

use crate::{
    aggregate::Aggregate,
    command::{Command, CommandHandler, Loader, short_type_name},
    error::{DispatchError, HandlerError, RegistrationError},
    replay::replay,
    subscriber::Subscriber,
};

/// Tunables for a [`Dispatcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// How many times a submission that lost an append race is re-run
    /// against the fresh stream. Zero reports the first conflict.
    pub max_conflict_retries: u32,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct Committed<E> {
    pub aggregate_id: AggregateId,

    /// Envelopes appended by this submission, oldest first. Empty when the
    /// handler produced no events.
    pub events: Vec<EventEnvelope<E>>,

    /// Stream length after the append.
    pub version: Version,
}

/// Type-erased entry point for one registered command type.
trait Route<C, E, X>: Send + Sync {
    fn aggregate_type(&self) -> &'static str;

    fn run(
        &self,
        target: AggregateId,
        stream: &[EventEnvelope<E>],
        command: &C,
    ) -> Result<Vec<E>, HandlerError<X>>;
}

struct HandlerRoute<H>(H);

impl<C, E, X, H> Route<C, E, X> for HandlerRoute<H>
where
    C: Command,
    E: DomainEvent,
    H: CommandHandler<C, Error = X>,
    H::Aggregate: Aggregate<Event = E>,
{
    fn aggregate_type(&self) -> &'static str {
        H::Aggregate::aggregate_type()
    }

    fn run(
        &self,
        target: AggregateId,
        stream: &[EventEnvelope<E>],
        command: &C,
    ) -> Result<Vec<E>, HandlerError<X>> {
        let mut loader = Loader::<H::Aggregate>::new(target, stream);
        self.0.handle(&mut loader, command)
    }
}

struct Subscription<E: DomainEvent> {
    kinds: HashSet<E::Kind>,
    subscriber: Arc<dyn Subscriber<E>>,
}

/// Collects handlers and subscribers before the dispatcher goes live.
pub struct DispatcherBuilder<E: DomainEvent, X> {
    store: Arc<dyn EventStore<E>>,
    routes: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    subscriptions: Vec<Subscription<E>>,
    config: DispatcherConfig,
    _error: PhantomData<fn() -> X>,
}

impl<E, X> DispatcherBuilder<E, X>
where
    E: DomainEvent,
    X: Send + Sync + 'static,
{
    /// Registers the handler for command type `C`.
    ///
    /// Each command type has exactly one handler; a second registration fails.
    pub fn handler<C, H>(mut self, handler: H) -> Result<Self, RegistrationError>
    where
        C: Command,
        H: CommandHandler<C, Error = X>,
        H::Aggregate: Aggregate<Event = E>,
    {
        let command_type = short_type_name::<C>();
        if self.routes.contains_key(&TypeId::of::<C>()) {
            return Err(RegistrationError::DuplicateHandler { command_type });
        }

        let route: Box<dyn Route<C, E, X>> = Box::new(HandlerRoute(handler));
        self.routes.insert(TypeId::of::<C>(), Box::new(route));
        tracing::debug!(command_type, "registered command handler");
        Ok(self)
    }

    /// Registers `subscriber` for the given event kinds.
    ///
    /// Subscribers are invoked in registration order.
    pub fn subscribe(
        mut self,
        kinds: impl IntoIterator<Item = E::Kind>,
        subscriber: Arc<dyn Subscriber<E>>,
    ) -> Self {
        let kinds: HashSet<E::Kind> = kinds.into_iter().collect();
        tracing::debug!(
            subscriber = subscriber.name(),
            kinds = kinds.len(),
            "registered subscriber"
        );
        self.subscriptions.push(Subscription { kinds, subscriber });
        self
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Freezes the registry.
    pub fn build(self) -> Dispatcher<E, X> {
        Dispatcher {
            store: self.store,
            routes: self.routes,
            subscriptions: self.subscriptions,
            lanes: DashMap::new(),
            config: self.config,
            _error: PhantomData,
        }
    }
}

/// Routes commands to their handlers and publishes what they commit.
///
/// Shared across tasks behind an `Arc`. There is no global lock: submissions
/// on different aggregates never wait for each other, and submissions on the
/// same aggregate only serialize around the append and the publication that
/// follows it.
pub struct Dispatcher<E: DomainEvent, X> {
    store: Arc<dyn EventStore<E>>,
    routes: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    subscriptions: Vec<Subscription<E>>,
    // Held from append through publication so subscribers see each
    // aggregate's events in commit order.
    lanes: DashMap<AggregateId, Arc<Mutex<()>>>,
    config: DispatcherConfig,
    _error: PhantomData<fn() -> X>,
}

impl<E, X> Dispatcher<E, X>
where
    E: DomainEvent,
    X: std::fmt::Display + Send + Sync + 'static,
{
    /// Starts building a dispatcher over `store`.
    pub fn builder<S>(store: S) -> DispatcherBuilder<E, X>
    where
        S: EventStore<E> + 'static,
    {
        DispatcherBuilder {
            store: Arc::new(store),
            routes: HashMap::new(),
            subscriptions: Vec::new(),
            config: DispatcherConfig::default(),
            _error: PhantomData,
        }
    }

    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    /// Returns the underlying event store.
    pub fn store(&self) -> &dyn EventStore<E> {
        self.store.as_ref()
    }

    /// Handles `command` and persists and publishes the events it produces.
    ///
    /// A domain error, a conflict or a replay failure leaves the store
    /// untouched and publishes nothing. Subscriber failures are logged and
    /// never reported here. Subscribers run inside the aggregate's commit
    /// lane, so they must not submit to the aggregate they are notified about.
    #[tracing::instrument(
        skip(self, command),
        fields(command = command.command_type(), aggregate_id = %command.aggregate_id())
    )]
    pub async fn submit<C: Command>(&self, command: C) -> Result<Committed<E>, DispatchError<X>> {
        let command_type = command.command_type();
        metrics::counter!("dispatcher_commands_submitted", "command" => command_type).increment(1);

        let result = self.execute(&command).await;
        if let Err(err) = &result {
            metrics::counter!("dispatcher_commands_rejected", "command" => command_type)
                .increment(1);
            tracing::debug!(error = %err, "command not committed");
        }
        result
    }

    async fn execute<C: Command>(&self, command: &C) -> Result<Committed<E>, DispatchError<X>> {
        let route = self
            .route::<C>()
            .ok_or(DispatchError::NoHandlerRegistered {
                command_type: command.command_type(),
            })?;
        let target = command.aggregate_id();
        let mut attempt = 0;

        loop {
            let stream: StreamSnapshot<E> = if command.creates_aggregate() {
                StreamSnapshot::default()
            } else {
                self.store.load_stream(target).await?
            };
            let expected = Version::from_len(stream.len());
            tracing::debug!(
                aggregate = route.aggregate_type(),
                %expected,
                attempt,
                "stream loaded"
            );

            let events = route.run(target, &stream, command)?;
            if events.is_empty() {
                tracing::debug!("command produced no events");
                return Ok(Committed {
                    aggregate_id: target,
                    events: Vec::new(),
                    version: expected,
                });
            }

            match self.commit(target, expected, events).await {
                Ok(committed) => {
                    let version = expected.advance(committed.len());
                    return Ok(Committed {
                        aggregate_id: target,
                        events: committed,
                        version,
                    });
                }
                Err(err) if err.is_conflict() && attempt < self.config.max_conflict_retries => {
                    attempt += 1;
                    tracing::warn!(error = %err, attempt, "append lost a race, retrying");
                }
                Err(err) => {
                    if err.is_conflict() {
                        tracing::warn!(error = %err, "append lost a race");
                    }
                    return Err(err.into());
                }
            }
        }
    }

    /// Rebuilds the aggregate from its stream and applies `f` to it.
    ///
    /// Read-only: nothing is appended and nothing is published.
    #[tracing::instrument(skip(self, f), fields(aggregate = A::aggregate_type()))]
    pub async fn query_aggregate<A, R>(
        &self,
        aggregate_id: AggregateId,
        f: impl FnOnce(&A) -> R,
    ) -> Result<R, DispatchError<X>>
    where
        A: Aggregate<Event = E>,
    {
        let stream = self.store.load_stream(aggregate_id).await?;
        let aggregate = replay::<A>(&stream)?;
        Ok(f(&aggregate))
    }

    fn route<C: Command>(&self) -> Option<&dyn Route<C, E, X>> {
        self.routes
            .get(&TypeId::of::<C>())
            .and_then(|route| route.downcast_ref::<Box<dyn Route<C, E, X>>>())
            .map(|route| &**route)
    }

    /// Appends `events` and publishes them inside the aggregate's lane.
    async fn commit(
        &self,
        target: AggregateId,
        expected: Version,
        events: Vec<E>,
    ) -> Result<Vec<EventEnvelope<E>>, EventStoreError> {
        let lane = Arc::clone(self.lanes.entry(target).or_default().value());
        let held = lane.lock().await;

        let outcome = self.store.append_events(target, expected, events).await;
        if let Ok(committed) = &outcome {
            tracing::debug!(count = committed.len(), "events committed");
            self.publish(committed).await;
        }

        drop(held);
        drop(lane);
        // Only the map holds an idle lane; waiters keep their own clone.
        self.lanes.remove_if(&target, |_, lane| Arc::strong_count(lane) == 1);
        outcome
    }

    /// Delivers each envelope to the subscribers registered for its kind.
    ///
    /// Returns the number of deliveries attempted.
    async fn publish(&self, committed: &[EventEnvelope<E>]) -> usize {
        let mut deliveries = 0;
        for envelope in committed {
            let kind = envelope.kind();
            let mut delivered = false;
            for subscription in self
                .subscriptions
                .iter()
                .filter(|subscription| subscription.kinds.contains(&kind))
            {
                delivered = true;
                deliveries += 1;
                let subscriber = subscription.subscriber.name();
                let outcome = AssertUnwindSafe(subscription.subscriber.on_event(envelope))
                    .catch_unwind()
                    .await;
                let failure = match outcome {
                    Ok(Ok(())) => continue,
                    Ok(Err(err)) => err.to_string(),
                    Err(panic) => panic_message(panic.as_ref()).to_owned(),
                };
                metrics::counter!(
                    "dispatcher_subscriber_failures",
                    "subscriber" => subscriber.to_owned()
                )
                .increment(1);
                tracing::error!(
                    subscriber,
                    event_type = %kind,
                    position = envelope.position,
                    error = %failure,
                    "subscriber failed to handle event"
                );
            }
            if delivered {
                metrics::counter!("dispatcher_events_published").increment(1);
            }
        }
        deliveries
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("subscriber panicked")
}
