//! Tab commands.

use common::AggregateId;
use domain::Command;

use crate::value_objects::{Money, OrderedItem};

/// Opens a new tab. The caller mints the tab's identifier.
#[derive(Debug, Clone)]
pub struct OpenTab {
    pub id: AggregateId,
    pub table_number: u32,
    pub waiter: String,
}

impl OpenTab {
    /// Opens a tab under a freshly minted identifier.
    pub fn new(table_number: u32, waiter: impl Into<String>) -> Self {
        Self {
            id: AggregateId::new(),
            table_number,
            waiter: waiter.into(),
        }
    }
}

impl Command for OpenTab {
    fn aggregate_id(&self) -> AggregateId {
        self.id
    }

    fn creates_aggregate(&self) -> bool {
        true
    }
}

/// Adds drinks and/or food to an open tab.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub id: AggregateId,
    pub items: Vec<OrderedItem>,
}

impl PlaceOrder {
    pub fn new(id: AggregateId, items: Vec<OrderedItem>) -> Self {
        Self { id, items }
    }
}

#[derive(Debug, Clone)]
pub struct MarkDrinksServed {
    pub id: AggregateId,
    pub menu_numbers: Vec<u32>,
}

impl MarkDrinksServed {
    pub fn new(id: AggregateId, menu_numbers: Vec<u32>) -> Self {
        Self { id, menu_numbers }
    }
}

#[derive(Debug, Clone)]
pub struct MarkFoodPrepared {
    pub id: AggregateId,
    pub menu_numbers: Vec<u32>,
}

impl MarkFoodPrepared {
    pub fn new(id: AggregateId, menu_numbers: Vec<u32>) -> Self {
        Self { id, menu_numbers }
    }
}

#[derive(Debug, Clone)]
pub struct MarkFoodServed {
    pub id: AggregateId,
    pub menu_numbers: Vec<u32>,
}

impl MarkFoodServed {
    pub fn new(id: AggregateId, menu_numbers: Vec<u32>) -> Self {
        Self { id, menu_numbers }
    }
}

/// Pays for and closes a tab.
#[derive(Debug, Clone)]
pub struct CloseTab {
    pub id: AggregateId,
    pub amount_paid: Money,
}

impl CloseTab {
    pub fn new(id: AggregateId, amount_paid: Money) -> Self {
        Self { id, amount_paid }
    }
}

macro_rules! impl_tab_command {
    ($($command:ident),* $(,)?) => {
        $(
            impl Command for $command {
                fn aggregate_id(&self) -> AggregateId {
                    self.id
                }
            }
        )*
    };
}

impl_tab_command!(
    PlaceOrder,
    MarkDrinksServed,
    MarkFoodPrepared,
    MarkFoodServed,
    CloseTab,
);
