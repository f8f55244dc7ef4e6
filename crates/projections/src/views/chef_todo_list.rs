//! Kitchen todo list: food ordered but not yet prepared.

use std::sync::Arc;

use async_trait::async_trait;
use cafe::{CafeEvent, CafeEventKind};
use common::AggregateId;
use domain::{Subscriber, SubscriberError};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::error::ProjectionError;
use crate::projection::{Projection, ProjectionPosition};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListItem {
    pub menu_number: u32,
    pub description: String,
}

/// The food from one order on one tab that is still to be prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListGroup {
    pub tab: AggregateId,
    pub items: Vec<TodoListItem>,
}

/// Read model view for the kitchen.
///
/// Groups appear in the order the food was ordered and disappear once
/// every item in them has been prepared.
#[derive(Clone)]
pub struct ChefTodoListView {
    groups: Arc<RwLock<Vec<TodoListGroup>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl ChefTodoListView {
    pub fn new() -> Self {
        Self {
            groups: Arc::new(RwLock::new(Vec::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Returns a copy of the current todo list.
    pub async fn todo_list(&self) -> Vec<TodoListGroup> {
        self.groups.read().await.clone()
    }

    fn remove_prepared(
        groups: &mut Vec<TodoListGroup>,
        tab: AggregateId,
        menu_numbers: &[u32],
    ) -> Result<()> {
        let mut updated = groups.clone();
        for &menu_number in menu_numbers {
            let (group, index) = updated
                .iter_mut()
                .filter(|group| group.tab == tab)
                .find_map(|group| {
                    let index = group
                        .items
                        .iter()
                        .position(|item| item.menu_number == menu_number)?;
                    Some((group, index))
                })
                .ok_or(ProjectionError::ItemNotFound {
                    tab_id: tab,
                    menu_number,
                })?;
            group.items.remove(index);
        }
        updated.retain(|group| !group.items.is_empty());
        *groups = updated;
        Ok(())
    }
}

impl Default for ChefTodoListView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscriber<CafeEvent> for ChefTodoListView {
    fn name(&self) -> &str {
        "chef-todo-list"
    }

    async fn on_event(
        &self,
        envelope: &EventEnvelope<CafeEvent>,
    ) -> std::result::Result<(), SubscriberError> {
        Ok(self.handle(envelope).await?)
    }
}

#[async_trait]
impl Projection<CafeEvent> for ChefTodoListView {
    fn interests(&self) -> Vec<CafeEventKind> {
        vec![CafeEventKind::FoodOrdered, CafeEventKind::FoodPrepared]
    }

    async fn handle(&self, envelope: &EventEnvelope<CafeEvent>) -> Result<()> {
        let mut groups = self.groups.write().await;

        match &envelope.event {
            CafeEvent::FoodOrdered(data) => {
                groups.push(TodoListGroup {
                    tab: data.id,
                    items: data
                        .items
                        .iter()
                        .map(|item| TodoListItem {
                            menu_number: item.menu_number,
                            description: item.description.clone(),
                        })
                        .collect(),
                });
            }
            CafeEvent::FoodPrepared(data) => {
                Self::remove_prepared(&mut groups, data.id, &data.menu_numbers)?;
            }
            _ => {}
        }

        drop(groups);
        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.groups.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}
