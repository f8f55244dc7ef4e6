//! The cafe tab domain.
//!
//! A waiter opens a tab for a table, drinks and food are ordered against it,
//! the kitchen prepares the food, items are served, and the tab is closed by
//! paying at least the value of what was served.

pub mod aggregate;
pub mod commands;
pub mod error;
pub mod events;
pub mod handlers;
pub mod value_objects;

pub use aggregate::TabAggregate;
pub use commands::{
    CloseTab, MarkDrinksServed, MarkFoodPrepared, MarkFoodServed, OpenTab, PlaceOrder,
};
pub use error::TabError;
pub use events::{
    CafeEvent, CafeEventKind, DrinksOrdered, DrinksServed, FoodOrdered, FoodPrepared, FoodServed,
    TabClosed, TabOpened,
};
pub use handlers::{CafeDispatcher, TabCommandHandlers, register_tab_handlers};
pub use value_objects::{Money, OrderedItem};
