//! Tab domain errors.

use domain::HandlerError;
use thiserror::Error;

/// Reasons a tab command is not admissible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TabError {
    #[error("Tab is not open")]
    TabNotOpen,

    #[error("Drinks are not outstanding on this tab")]
    DrinksNotOutstanding,

    #[error("Food is not outstanding on this tab")]
    FoodNotOutstanding,

    #[error("Food has not been prepared")]
    FoodNotPrepared,

    #[error("Amount paid does not cover the served items")]
    MustPayEnough,

    #[error("Tab has unserved items")]
    TabHasUnservedItems,
}

impl From<TabError> for HandlerError<TabError> {
    fn from(err: TabError) -> Self {
        HandlerError::Domain(err)
    }
}
