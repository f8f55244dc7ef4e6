//! Read model views for the CQRS query side.

pub mod chef_todo_list;
pub mod open_tabs;

pub use chef_todo_list::{ChefTodoListView, TodoListGroup, TodoListItem};
pub use open_tabs::{ItemStatus, OpenTabsView, TabInvoice, TabItem, TabStatus};
