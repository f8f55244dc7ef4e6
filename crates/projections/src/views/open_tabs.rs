//! Open tabs read model: what each table ordered and where it stands.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use cafe::{CafeEvent, CafeEventKind, Money, OrderedItem};
use common::AggregateId;
use domain::{Subscriber, SubscriberError};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::error::ProjectionError;
use crate::projection::{Projection, ProjectionPosition};
use crate::Result;

/// Where an item on a tab is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    NeedsPreparing,
    NeedsServing,
    Served,
}

/// A single item on a tab, as shown to staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabItem {
    pub menu_number: u32,
    pub description: String,
    pub price: Money,
}

impl From<&OrderedItem> for TabItem {
    fn from(item: &OrderedItem) -> Self {
        Self {
            menu_number: item.menu_number,
            description: item.description.clone(),
            price: item.price,
        }
    }
}

/// The state of a table's tab, split by item status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabStatus {
    pub tab_id: AggregateId,
    pub table_number: u32,
    pub to_serve: Vec<TabItem>,
    pub in_preparation: Vec<TabItem>,
    pub served: Vec<TabItem>,
}

/// What a table owes for the items served so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInvoice {
    pub tab_id: AggregateId,
    pub table_number: u32,
    pub items: Vec<TabItem>,
    pub total: Money,
    pub has_unserved_items: bool,
}

#[derive(Debug, Clone)]
struct TrackedItem {
    item: TabItem,
    status: ItemStatus,
}

#[derive(Debug, Clone)]
struct OpenTab {
    /// Order in which the tab was opened within this view.
    opened: u64,
    table_number: u32,
    waiter: String,
    items: Vec<TrackedItem>,
}

impl OpenTab {
    fn with_status(&self, status: ItemStatus) -> Vec<TabItem> {
        self.items
            .iter()
            .filter(|tracked| tracked.status == status)
            .map(|tracked| tracked.item.clone())
            .collect()
    }
}

#[derive(Debug, Default)]
struct Tabs {
    by_id: HashMap<AggregateId, OpenTab>,
    opened: u64,
}

impl Tabs {
    /// The earliest opened tab still open at `table_number`.
    fn for_table(&self, table_number: u32) -> Option<(AggregateId, &OpenTab)> {
        self.by_id
            .iter()
            .filter(|(_, tab)| tab.table_number == table_number)
            .min_by_key(|(_, tab)| tab.opened)
            .map(|(id, tab)| (*id, tab))
    }

    fn get_mut(&mut self, tab_id: AggregateId) -> Result<&mut OpenTab> {
        self.by_id
            .get_mut(&tab_id)
            .ok_or(ProjectionError::UnknownTab { tab_id })
    }
}

/// Read model view for tabs that have been opened and not yet closed.
///
/// Tabs are removed from this view when they are closed. When two open tabs
/// share a table number, per-table queries answer for the one opened first.
#[derive(Clone)]
pub struct OpenTabsView {
    tabs: Arc<RwLock<Tabs>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl OpenTabsView {
    /// Creates a new empty open tabs view.
    pub fn new() -> Self {
        Self {
            tabs: Arc::new(RwLock::new(Tabs::default())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Table numbers with an open tab, in ascending order.
    pub async fn active_table_numbers(&self) -> Vec<u32> {
        let mut tables: Vec<u32> = self
            .tabs
            .read()
            .await
            .by_id
            .values()
            .map(|tab| tab.table_number)
            .collect();
        tables.sort_unstable();
        tables
    }

    pub async fn tab_id_for_table(&self, table_number: u32) -> Option<AggregateId> {
        self.tabs
            .read()
            .await
            .for_table(table_number)
            .map(|(id, _)| id)
    }

    /// Items waiting to be served on the waiter's tables, keyed by table.
    ///
    /// Tables with nothing to serve are left out. Tabs sharing a table are
    /// listed together, earliest opened first.
    pub async fn todo_list_for_waiter(&self, waiter: &str) -> BTreeMap<u32, Vec<TabItem>> {
        let tabs = self.tabs.read().await;
        let mut waiting: Vec<&OpenTab> = tabs
            .by_id
            .values()
            .filter(|tab| tab.waiter == waiter)
            .collect();
        waiting.sort_by_key(|tab| tab.opened);

        let mut todo: BTreeMap<u32, Vec<TabItem>> = BTreeMap::new();
        for tab in waiting {
            let to_serve = tab.with_status(ItemStatus::NeedsServing);
            if !to_serve.is_empty() {
                todo.entry(tab.table_number).or_default().extend(to_serve);
            }
        }
        todo
    }

    pub async fn tab_for_table(&self, table_number: u32) -> Option<TabStatus> {
        let tabs = self.tabs.read().await;
        let (tab_id, tab) = tabs.for_table(table_number)?;

        Some(TabStatus {
            tab_id,
            table_number,
            to_serve: tab.with_status(ItemStatus::NeedsServing),
            in_preparation: tab.with_status(ItemStatus::NeedsPreparing),
            served: tab.with_status(ItemStatus::Served),
        })
    }

    /// Builds the bill for a table from the items served so far.
    pub async fn invoice_for_table(&self, table_number: u32) -> Option<TabInvoice> {
        let tabs = self.tabs.read().await;
        let (tab_id, tab) = tabs.for_table(table_number)?;

        let items = tab.with_status(ItemStatus::Served);
        let total = items.iter().map(|item| item.price).sum();
        let has_unserved_items = tab
            .items
            .iter()
            .any(|tracked| tracked.status != ItemStatus::Served);

        Some(TabInvoice {
            tab_id,
            table_number,
            items,
            total,
            has_unserved_items,
        })
    }

    fn add_items(
        tabs: &mut Tabs,
        tab_id: AggregateId,
        items: &[OrderedItem],
        status: ItemStatus,
    ) -> Result<()> {
        let tab = tabs.get_mut(tab_id)?;
        tab.items.extend(items.iter().map(|item| TrackedItem {
            item: item.into(),
            status,
        }));
        Ok(())
    }

    /// Moves one item per menu number from `from` to `to`.
    ///
    /// Either every number is found or the tab is left untouched.
    fn move_items(
        tabs: &mut Tabs,
        tab_id: AggregateId,
        menu_numbers: &[u32],
        from: ItemStatus,
        to: ItemStatus,
    ) -> Result<()> {
        let tab = tabs.get_mut(tab_id)?;

        let mut items = tab.items.clone();
        for &menu_number in menu_numbers {
            let tracked = items
                .iter_mut()
                .find(|tracked| tracked.item.menu_number == menu_number && tracked.status == from)
                .ok_or(ProjectionError::ItemNotFound {
                    tab_id,
                    menu_number,
                })?;
            tracked.status = to;
        }
        tab.items = items;
        Ok(())
    }
}

impl Default for OpenTabsView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscriber<CafeEvent> for OpenTabsView {
    fn name(&self) -> &str {
        "open-tabs"
    }

    async fn on_event(
        &self,
        envelope: &EventEnvelope<CafeEvent>,
    ) -> std::result::Result<(), SubscriberError> {
        Ok(self.handle(envelope).await?)
    }
}

#[async_trait]
impl Projection<CafeEvent> for OpenTabsView {
    fn interests(&self) -> Vec<CafeEventKind> {
        CafeEventKind::ALL.to_vec()
    }

    async fn handle(&self, envelope: &EventEnvelope<CafeEvent>) -> Result<()> {
        let mut tabs = self.tabs.write().await;

        match &envelope.event {
            CafeEvent::TabOpened(data) => {
                tabs.opened += 1;
                let opened = tabs.opened;
                tabs.by_id.insert(
                    data.id,
                    OpenTab {
                        opened,
                        table_number: data.table_number,
                        waiter: data.waiter.clone(),
                        items: Vec::new(),
                    },
                );
            }
            CafeEvent::DrinksOrdered(data) => {
                Self::add_items(&mut tabs, data.id, &data.items, ItemStatus::NeedsServing)?;
            }
            CafeEvent::FoodOrdered(data) => {
                Self::add_items(&mut tabs, data.id, &data.items, ItemStatus::NeedsPreparing)?;
            }
            CafeEvent::FoodPrepared(data) => {
                Self::move_items(
                    &mut tabs,
                    data.id,
                    &data.menu_numbers,
                    ItemStatus::NeedsPreparing,
                    ItemStatus::NeedsServing,
                )?;
            }
            CafeEvent::DrinksServed(data) => {
                Self::move_items(
                    &mut tabs,
                    data.id,
                    &data.menu_numbers,
                    ItemStatus::NeedsServing,
                    ItemStatus::Served,
                )?;
            }
            CafeEvent::FoodServed(data) => {
                Self::move_items(
                    &mut tabs,
                    data.id,
                    &data.menu_numbers,
                    ItemStatus::NeedsServing,
                    ItemStatus::Served,
                )?;
            }
            CafeEvent::TabClosed(data) => {
                tabs.by_id
                    .remove(&data.id)
                    .ok_or(ProjectionError::UnknownTab { tab_id: data.id })?;
            }
        }

        drop(tabs);
        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        *self.tabs.write().await = Tabs::default();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}
