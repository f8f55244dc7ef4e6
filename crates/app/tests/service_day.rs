//! End-to-end: bootstrap the cafe and run a scripted service through it.

use app::{Cafe, Config, run_service_day};
use cafe::{CafeEvent, DrinksOrdered, Money, OpenTab, OrderedItem, PlaceOrder, TabOpened};
use common::AggregateId;
use event_store::{EventStore, EventStoreExt, InMemoryEventStore, Version};

#[tokio::test]
async fn test_service_day_on_empty_store() {
    let store = InMemoryEventStore::new();
    let cafe = Cafe::bootstrap(store.clone(), &Config::default())
        .await
        .unwrap();

    let summary = run_service_day(&cafe).await.unwrap();

    assert_eq!(summary.tabs_opened, 3);
    assert_eq!(summary.tabs_closed, 2);
    assert_eq!(summary.takings, Money::from_cents(2200));
    assert_eq!(summary.tips, Money::from_cents(200));
    assert_eq!(summary.open_tables, vec![7]);

    // Table 7's food was prepared but never served.
    let status = cafe.open_tabs.tab_for_table(7).await.unwrap();
    assert_eq!(status.to_serve.len(), 2);
    assert!(cafe.chef_todo_list.todo_list().await.is_empty());
    assert_eq!(store.stream_count(), 3);
}

#[tokio::test]
async fn test_bootstrap_catches_up_existing_tabs() {
    let store = InMemoryEventStore::new();
    let id = AggregateId::new();
    let events: Vec<CafeEvent> = vec![
        TabOpened {
            id,
            table_number: 12,
            waiter: "Sam".to_string(),
        }
        .into(),
        DrinksOrdered {
            id,
            items: vec![OrderedItem::drink(10, "Beer", Money::from_cents(250))],
        }
        .into(),
    ];
    store
        .append_events(id, Version::initial(), events)
        .await
        .unwrap();

    let cafe = Cafe::bootstrap(store.clone(), &Config::default())
        .await
        .unwrap();

    assert_eq!(cafe.open_tabs.tab_id_for_table(12).await, Some(id));
    assert_eq!(cafe.open_tabs.todo_list_for_waiter("Sam").await[&12].len(), 1);

    // Events committed after bootstrap arrive through publication.
    cafe.dispatcher
        .submit(PlaceOrder::new(
            id,
            vec![OrderedItem::food(16, "Beef Noodles", Money::from_cents(750))],
        ))
        .await
        .unwrap();
    assert_eq!(cafe.chef_todo_list.todo_list().await.len(), 1);
    assert_eq!(store.stream_version(id).await.unwrap(), Version::new(3));
}

#[tokio::test]
async fn test_bootstrap_applies_retry_config() {
    let config = Config {
        conflict_retries: 2,
        ..Config::default()
    };
    let cafe = Cafe::bootstrap(InMemoryEventStore::new(), &config)
        .await
        .unwrap();

    assert_eq!(cafe.dispatcher.config().max_conflict_retries, 2);
    cafe.dispatcher.submit(OpenTab::new(1, "Derek")).await.unwrap();
    assert_eq!(cafe.open_tabs.active_table_numbers().await, vec![1]);
}
