//! Tab aggregate implementation.

use domain::{Aggregate, ReplayError};
use event_store::Version;

use crate::events::CafeEvent;
use crate::value_objects::{Money, OrderedItem};

/// Tab aggregate root.
///
/// Tracks what is still owed to the table and what has been served, which
/// is all the handlers need to accept or reject a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabAggregate {
    open: bool,
    outstanding_drinks: Vec<OrderedItem>,
    outstanding_food: Vec<OrderedItem>,
    prepared_food: Vec<OrderedItem>,
    served_items_value: Money,
    version: Version,
}

impl Aggregate for TabAggregate {
    type Event = CafeEvent;

    fn aggregate_type() -> &'static str {
        "Tab"
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: &CafeEvent) -> Result<(), ReplayError> {
        match event {
            CafeEvent::TabOpened(_) => self.open = true,
            CafeEvent::DrinksOrdered(e) => self.outstanding_drinks.extend(e.items.iter().cloned()),
            CafeEvent::FoodOrdered(e) => self.outstanding_food.extend(e.items.iter().cloned()),
            CafeEvent::DrinksServed(e) => {
                for &number in &e.menu_numbers {
                    if let Some(item) = take_item(&mut self.outstanding_drinks, number) {
                        self.served_items_value += item.price;
                    }
                }
            }
            CafeEvent::FoodPrepared(e) => {
                for &number in &e.menu_numbers {
                    if let Some(item) = take_item(&mut self.outstanding_food, number) {
                        self.prepared_food.push(item);
                    }
                }
            }
            CafeEvent::FoodServed(e) => {
                for &number in &e.menu_numbers {
                    if let Some(item) = take_item(&mut self.prepared_food, number) {
                        self.served_items_value += item.price;
                    }
                }
            }
            CafeEvent::TabClosed(_) => self.open = false,
        }
        Ok(())
    }
}

// Query methods
impl TabAggregate {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Value of every drink and dish served so far.
    pub fn served_items_value(&self) -> Money {
        self.served_items_value
    }

    pub fn are_drinks_outstanding(&self, menu_numbers: &[u32]) -> bool {
        all_in(menu_numbers, &self.outstanding_drinks)
    }

    pub fn is_food_outstanding(&self, menu_numbers: &[u32]) -> bool {
        all_in(menu_numbers, &self.outstanding_food)
    }

    pub fn is_food_prepared(&self, menu_numbers: &[u32]) -> bool {
        all_in(menu_numbers, &self.prepared_food)
    }

    /// True while anything ordered has not reached the table.
    pub fn has_unserved_items(&self) -> bool {
        !self.outstanding_drinks.is_empty()
            || !self.outstanding_food.is_empty()
            || !self.prepared_food.is_empty()
    }
}

/// Multiset containment: each wanted number consumes one matching item.
fn all_in(want: &[u32], have: &[OrderedItem]) -> bool {
    let mut remaining: Vec<u32> = have.iter().map(|item| item.menu_number).collect();
    want.iter().all(|number| {
        match remaining.iter().position(|candidate| candidate == number) {
            Some(index) => {
                remaining.swap_remove(index);
                true
            }
            None => false,
        }
    })
}

fn take_item(items: &mut Vec<OrderedItem>, menu_number: u32) -> Option<OrderedItem> {
    let index = items.iter().position(|item| item.menu_number == menu_number)?;
    Some(items.remove(index))
}
