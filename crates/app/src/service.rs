//! A scripted service: a few tables come in, order, eat, and pay.

use cafe::{
    CloseTab, MarkDrinksServed, MarkFoodPrepared, MarkFoodServed, Money, OpenTab, OrderedItem,
    PlaceOrder, TabError,
};
use common::AggregateId;
use domain::DispatchError;

use crate::error::AppError;
use crate::Cafe;

/// What happened during a scripted service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub tabs_opened: usize,
    pub tabs_closed: usize,
    pub takings: Money,
    pub tips: Money,
    /// Tables still sitting at the end of the service.
    pub open_tables: Vec<u32>,
}

fn lemonade() -> OrderedItem {
    OrderedItem::drink(2, "Lemonade", Money::from_cents(150))
}

fn beer() -> OrderedItem {
    OrderedItem::drink(10, "Beer", Money::from_cents(250))
}

fn noodles() -> OrderedItem {
    OrderedItem::food(16, "Beef Noodles", Money::from_cents(750))
}

fn curry() -> OrderedItem {
    OrderedItem::food(25, "Vegetable Curry", Money::from_cents(600))
}

async fn open(cafe: &Cafe, table: u32, waiter: &str) -> Result<AggregateId, AppError> {
    let command = OpenTab::new(table, waiter);
    let id = command.id;
    cafe.dispatcher.submit(command).await?;
    Ok(id)
}

/// Pays the table's bill plus `tip`, returning what was paid.
async fn settle(cafe: &Cafe, table: u32, tip: Money) -> Result<Money, AppError> {
    let invoice = cafe
        .open_tabs
        .invoice_for_table(table)
        .await
        .ok_or_else(|| AppError::Script(format!("no open tab for table {table}")))?;

    let paid = invoice.total + tip;
    let committed = cafe.dispatcher.submit(CloseTab::new(invoice.tab_id, paid)).await?;
    tracing::info!(table, %paid, version = %committed.version, "tab closed");
    Ok(paid)
}

/// Runs three tables through a service against `cafe`.
///
/// Table 7 leaves before its food arrives, so it stays open. A short payment
/// at table 3 is refused and then settled properly.
#[tracing::instrument(skip_all)]
pub async fn run_service_day(cafe: &Cafe) -> Result<ServiceSummary, AppError> {
    let t3 = open(cafe, 3, "Derek").await?;
    let t5 = open(cafe, 5, "Derek").await?;
    let t7 = open(cafe, 7, "Sam").await?;

    cafe.dispatcher
        .submit(PlaceOrder::new(t3, vec![beer(), beer(), noodles()]))
        .await?;
    cafe.dispatcher
        .submit(PlaceOrder::new(t5, vec![lemonade(), curry()]))
        .await?;
    cafe.dispatcher
        .submit(PlaceOrder::new(t7, vec![curry(), noodles()]))
        .await?;

    for (table, items) in cafe.open_tabs.todo_list_for_waiter("Derek").await {
        tracing::info!(table, items = items.len(), "drinks to serve");
    }
    cafe.dispatcher
        .submit(MarkDrinksServed::new(t3, vec![10, 10]))
        .await?;
    cafe.dispatcher
        .submit(MarkDrinksServed::new(t5, vec![2]))
        .await?;

    for group in cafe.chef_todo_list.todo_list().await {
        let menu_numbers: Vec<u32> = group.items.iter().map(|item| item.menu_number).collect();
        cafe.dispatcher
            .submit(MarkFoodPrepared::new(group.tab, menu_numbers))
            .await?;
    }

    cafe.dispatcher
        .submit(MarkFoodServed::new(t3, vec![16]))
        .await?;
    cafe.dispatcher
        .submit(MarkFoodServed::new(t5, vec![25]))
        .await?;

    match cafe
        .dispatcher
        .submit(CloseTab::new(t3, Money::from_cents(100)))
        .await
    {
        Err(DispatchError::Domain(TabError::MustPayEnough)) => {
            tracing::warn!(table = 3, "payment refused, not enough paid");
        }
        Err(other) => return Err(other.into()),
        Ok(_) => {
            return Err(AppError::Script(
                "short payment was accepted at table 3".to_string(),
            ));
        }
    }

    let mut takings = Money::zero();
    let mut tips = Money::zero();
    for (table, tip) in [(3, Money::from_cents(200)), (5, Money::zero())] {
        takings += settle(cafe, table, tip).await?;
        tips += tip;
    }

    Ok(ServiceSummary {
        tabs_opened: 3,
        tabs_closed: 2,
        takings,
        tips,
        open_tables: cafe.open_tabs.active_table_numbers().await,
    })
}
