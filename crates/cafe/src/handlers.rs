//! Tab command handlers.

use domain::{
    CommandHandler, Dispatcher, DispatcherBuilder, HandlerError, Loader, RegistrationError,
};

use crate::{
    aggregate::TabAggregate,
    commands::{CloseTab, MarkDrinksServed, MarkFoodPrepared, MarkFoodServed, OpenTab, PlaceOrder},
    error::TabError,
    events::{
        CafeEvent, DrinksOrdered, DrinksServed, FoodOrdered, FoodPrepared, FoodServed, TabClosed,
        TabOpened,
    },
};

/// Dispatcher specialised to the cafe domain.
pub type CafeDispatcher = Dispatcher<CafeEvent, TabError>;

type Handled = Result<Vec<CafeEvent>, HandlerError<TabError>>;

/// Decides what each tab command does.
///
/// Stateless; one value serves every tab command.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabCommandHandlers;

impl CommandHandler<OpenTab> for TabCommandHandlers {
    type Aggregate = TabAggregate;
    type Error = TabError;

    fn handle(&self, _loader: &mut Loader<'_, TabAggregate>, command: &OpenTab) -> Handled {
        Ok(vec![
            TabOpened {
                id: command.id,
                table_number: command.table_number,
                waiter: command.waiter.clone(),
            }
            .into(),
        ])
    }
}

impl CommandHandler<PlaceOrder> for TabCommandHandlers {
    type Aggregate = TabAggregate;
    type Error = TabError;

    fn handle(&self, loader: &mut Loader<'_, TabAggregate>, command: &PlaceOrder) -> Handled {
        let tab = loader.load(command.id)?;
        if !tab.is_open() {
            return Err(TabError::TabNotOpen.into());
        }

        let (drinks, food): (Vec<_>, Vec<_>) =
            command.items.iter().cloned().partition(|item| item.is_drink);

        let mut events = Vec::with_capacity(2);
        if !drinks.is_empty() {
            events.push(
                DrinksOrdered {
                    id: command.id,
                    items: drinks,
                }
                .into(),
            );
        }
        if !food.is_empty() {
            events.push(
                FoodOrdered {
                    id: command.id,
                    items: food,
                }
                .into(),
            );
        }
        Ok(events)
    }
}

impl CommandHandler<MarkDrinksServed> for TabCommandHandlers {
    type Aggregate = TabAggregate;
    type Error = TabError;

    fn handle(
        &self,
        loader: &mut Loader<'_, TabAggregate>,
        command: &MarkDrinksServed,
    ) -> Handled {
        let tab = loader.load(command.id)?;
        if !tab.are_drinks_outstanding(&command.menu_numbers) {
            return Err(TabError::DrinksNotOutstanding.into());
        }

        Ok(vec![
            DrinksServed {
                id: command.id,
                menu_numbers: command.menu_numbers.clone(),
            }
            .into(),
        ])
    }
}

impl CommandHandler<MarkFoodPrepared> for TabCommandHandlers {
    type Aggregate = TabAggregate;
    type Error = TabError;

    fn handle(
        &self,
        loader: &mut Loader<'_, TabAggregate>,
        command: &MarkFoodPrepared,
    ) -> Handled {
        let tab = loader.load(command.id)?;
        if !tab.is_food_outstanding(&command.menu_numbers) {
            return Err(TabError::FoodNotOutstanding.into());
        }

        Ok(vec![
            FoodPrepared {
                id: command.id,
                menu_numbers: command.menu_numbers.clone(),
            }
            .into(),
        ])
    }
}

impl CommandHandler<MarkFoodServed> for TabCommandHandlers {
    type Aggregate = TabAggregate;
    type Error = TabError;

    fn handle(&self, loader: &mut Loader<'_, TabAggregate>, command: &MarkFoodServed) -> Handled {
        let tab = loader.load(command.id)?;
        if !tab.is_food_prepared(&command.menu_numbers) {
            return Err(TabError::FoodNotPrepared.into());
        }

        Ok(vec![
            FoodServed {
                id: command.id,
                menu_numbers: command.menu_numbers.clone(),
            }
            .into(),
        ])
    }
}

impl CommandHandler<CloseTab> for TabCommandHandlers {
    type Aggregate = TabAggregate;
    type Error = TabError;

    fn handle(&self, loader: &mut Loader<'_, TabAggregate>, command: &CloseTab) -> Handled {
        let tab = loader.load(command.id)?;
        if !tab.is_open() {
            return Err(TabError::TabNotOpen.into());
        }
        if tab.has_unserved_items() {
            return Err(TabError::TabHasUnservedItems.into());
        }
        let order_value = tab.served_items_value();
        if command.amount_paid < order_value {
            return Err(TabError::MustPayEnough.into());
        }

        Ok(vec![
            TabClosed {
                id: command.id,
                amount_paid: command.amount_paid,
                order_value,
                tip_value: command.amount_paid - order_value,
            }
            .into(),
        ])
    }
}

/// Registers [`TabCommandHandlers`] for every tab command.
pub fn register_tab_handlers(
    builder: DispatcherBuilder<CafeEvent, TabError>,
) -> Result<DispatcherBuilder<CafeEvent, TabError>, RegistrationError> {
    builder
        .handler::<OpenTab, _>(TabCommandHandlers)?
        .handler::<PlaceOrder, _>(TabCommandHandlers)?
        .handler::<MarkDrinksServed, _>(TabCommandHandlers)?
        .handler::<MarkFoodPrepared, _>(TabCommandHandlers)?
        .handler::<MarkFoodServed, _>(TabCommandHandlers)?
        .handler::<CloseTab, _>(TabCommandHandlers)
}
