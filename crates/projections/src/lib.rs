//! Read models for the CQRS query side.
//!
//! This crate provides:
//! - [`Projection`], a [`Subscriber`](domain::Subscriber) that maintains a
//!   queryable view and can be reset and replayed
//! - [`ProjectionProcessor`] for bootstrapping projections from the store
//! - two views: [`OpenTabsView`] for wait staff and [`ChefTodoListView`]
//!   for the kitchen

pub mod error;
pub mod processor;
pub mod projection;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition, subscribe_projection};
pub use views::{
    ChefTodoListView, ItemStatus, OpenTabsView, TabInvoice, TabItem, TabStatus, TodoListGroup,
    TodoListItem,
};
