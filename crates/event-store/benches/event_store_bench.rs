use std::fmt;

use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    AggregateId, DomainEvent, EventStore, EventStoreExt, InMemoryEventStore, Version,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CounterKind;

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Incremented")
    }
}

#[derive(Debug, Clone)]
struct Incremented {
    id: AggregateId,
    by: u64,
}

impl DomainEvent for Incremented {
    type Kind = CounterKind;

    fn kind(&self) -> CounterKind {
        CounterKind
    }

    fn aggregate_id(&self) -> AggregateId {
        self.id
    }
}

fn make_events(id: AggregateId, count: u64) -> Vec<Incremented> {
    (0..count).map(|by| Incremented { id, by }).collect()
}

fn bench_append_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let id = AggregateId::new();
                store
                    .append_events(id, Version::initial(), make_events(id, 1))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_batch_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let id = AggregateId::new();
                store
                    .append_events(id, Version::initial(), make_events(id, 10))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_to_long_stream(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let id = AggregateId::new();

    rt.block_on(async {
        store
            .append_events(id, Version::initial(), make_events(id, 100))
            .await
            .unwrap();
    });

    c.bench_function("event_store/append_after_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                let expected = store.stream_version(id).await.unwrap();
                store
                    .append_events(id, expected, make_events(id, 1))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_load_stream_100(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let id = AggregateId::new();

    rt.block_on(async {
        store
            .append_events(id, Version::initial(), make_events(id, 100))
            .await
            .unwrap();
    });

    c.bench_function("event_store/load_stream_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                let stream = store.load_stream(id).await.unwrap();
                assert_eq!(stream.len(), 100);
                stream.iter().map(|e| e.event.by).sum::<u64>()
            })
        });
    });
}

fn bench_stream_ids_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    rt.block_on(async {
        for _ in 0..10 {
            let id = AggregateId::new();
            store
                .append_events(id, Version::initial(), make_events(id, 100))
                .await
                .unwrap();
        }
    });

    c.bench_function("event_store/stream_ids_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                assert_eq!(store.stream_ids().await.unwrap().len(), 10);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single_event,
    bench_append_batch_10,
    bench_append_to_long_stream,
    bench_load_stream_100,
    bench_stream_ids_10,
);
criterion_main!(benches);
