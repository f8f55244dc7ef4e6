//! Tab domain events.

use common::{AggregateId, DomainEvent};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Money, OrderedItem};

/// Event kinds, used to register subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CafeEventKind {
    TabOpened,
    DrinksOrdered,
    FoodOrdered,
    DrinksServed,
    FoodPrepared,
    FoodServed,
    TabClosed,
}

impl CafeEventKind {
    /// Every kind, in lifecycle order.
    pub const ALL: [CafeEventKind; 7] = [
        CafeEventKind::TabOpened,
        CafeEventKind::DrinksOrdered,
        CafeEventKind::FoodOrdered,
        CafeEventKind::DrinksServed,
        CafeEventKind::FoodPrepared,
        CafeEventKind::FoodServed,
        CafeEventKind::TabClosed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CafeEventKind::TabOpened => "TabOpened",
            CafeEventKind::DrinksOrdered => "DrinksOrdered",
            CafeEventKind::FoodOrdered => "FoodOrdered",
            CafeEventKind::DrinksServed => "DrinksServed",
            CafeEventKind::FoodPrepared => "FoodPrepared",
            CafeEventKind::FoodServed => "FoodServed",
            CafeEventKind::TabClosed => "TabClosed",
        }
    }
}

impl std::fmt::Display for CafeEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that can occur on a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CafeEvent {
    /// A waiter opened a tab for a table.
    TabOpened(TabOpened),

    /// Drinks were added to the tab.
    DrinksOrdered(DrinksOrdered),

    /// Food was added to the tab and sent to the kitchen.
    FoodOrdered(FoodOrdered),

    DrinksServed(DrinksServed),

    /// The kitchen finished preparing food.
    FoodPrepared(FoodPrepared),

    FoodServed(FoodServed),

    /// The tab was paid and closed.
    TabClosed(TabClosed),
}

impl DomainEvent for CafeEvent {
    type Kind = CafeEventKind;

    fn kind(&self) -> CafeEventKind {
        match self {
            CafeEvent::TabOpened(_) => CafeEventKind::TabOpened,
            CafeEvent::DrinksOrdered(_) => CafeEventKind::DrinksOrdered,
            CafeEvent::FoodOrdered(_) => CafeEventKind::FoodOrdered,
            CafeEvent::DrinksServed(_) => CafeEventKind::DrinksServed,
            CafeEvent::FoodPrepared(_) => CafeEventKind::FoodPrepared,
            CafeEvent::FoodServed(_) => CafeEventKind::FoodServed,
            CafeEvent::TabClosed(_) => CafeEventKind::TabClosed,
        }
    }

    fn aggregate_id(&self) -> AggregateId {
        match self {
            CafeEvent::TabOpened(e) => e.id,
            CafeEvent::DrinksOrdered(e) => e.id,
            CafeEvent::FoodOrdered(e) => e.id,
            CafeEvent::DrinksServed(e) => e.id,
            CafeEvent::FoodPrepared(e) => e.id,
            CafeEvent::FoodServed(e) => e.id,
            CafeEvent::TabClosed(e) => e.id,
        }
    }
}

/// Data for TabOpened event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabOpened {
    pub id: AggregateId,
    pub table_number: u32,
    pub waiter: String,
}

/// Data for DrinksOrdered event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinksOrdered {
    pub id: AggregateId,
    pub items: Vec<OrderedItem>,
}

/// Data for FoodOrdered event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodOrdered {
    pub id: AggregateId,
    pub items: Vec<OrderedItem>,
}

/// Data for DrinksServed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinksServed {
    pub id: AggregateId,
    pub menu_numbers: Vec<u32>,
}

/// Data for FoodPrepared event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodPrepared {
    pub id: AggregateId,
    pub menu_numbers: Vec<u32>,
}

/// Data for FoodServed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodServed {
    pub id: AggregateId,
    pub menu_numbers: Vec<u32>,
}

/// Data for TabClosed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabClosed {
    pub id: AggregateId,
    pub amount_paid: Money,
    /// Value of everything served on the tab.
    pub order_value: Money,
    /// What was paid on top of the order value.
    pub tip_value: Money,
}

macro_rules! impl_from_payload {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for CafeEvent {
                fn from(event: $variant) -> Self {
                    CafeEvent::$variant(event)
                }
            }
        )*
    };
}

impl_from_payload!(
    TabOpened,
    DrinksOrdered,
    FoodOrdered,
    DrinksServed,
    FoodPrepared,
    FoodServed,
    TabClosed,
);
