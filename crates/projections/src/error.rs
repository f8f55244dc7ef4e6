//! Projection error types.

use common::AggregateId;
use thiserror::Error;

/// Errors that can occur during projection processing.
///
/// `UnknownTab` and `ItemNotFound` mean the view received an event its
/// earlier history does not explain, usually because it was registered too
/// late.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    #[error("No open tab with id {tab_id}")]
    UnknownTab { tab_id: AggregateId },

    #[error("Tab {tab_id} has no item {menu_number} in the expected state")]
    ItemNotFound {
        tab_id: AggregateId,
        menu_number: u32,
    },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
