//! Wiring for the cafe: the dispatcher, its handlers and the read models.
//!
//! [`Cafe::bootstrap`] brings the read models up to date with whatever the
//! store already holds, then builds a dispatcher that keeps them current.

pub mod config;
pub mod error;
pub mod service;

use std::sync::Arc;

use cafe::{CafeDispatcher, CafeEvent, register_tab_handlers};
use event_store::EventStore;
use projections::{ChefTodoListView, OpenTabsView, ProjectionProcessor, subscribe_projection};

pub use config::{Config, LogFormat};
pub use error::AppError;
pub use service::{ServiceSummary, run_service_day};

/// A running cafe: commands go in through `dispatcher`, staff read the views.
pub struct Cafe {
    pub dispatcher: CafeDispatcher,
    pub open_tabs: Arc<OpenTabsView>,
    pub chef_todo_list: Arc<ChefTodoListView>,
}

impl Cafe {
    /// Replays `store` into fresh views and wires them to a new dispatcher.
    #[tracing::instrument(skip_all)]
    pub async fn bootstrap<S>(store: S, config: &Config) -> Result<Self, AppError>
    where
        S: EventStore<CafeEvent> + Clone + 'static,
    {
        let open_tabs = Arc::new(OpenTabsView::new());
        let chef_todo_list = Arc::new(ChefTodoListView::new());

        let mut processor = ProjectionProcessor::<CafeEvent>::new(store.clone());
        processor.register(open_tabs.clone());
        processor.register(chef_todo_list.clone());
        let replayed = processor.run_catch_up().await?;

        let builder = register_tab_handlers(CafeDispatcher::builder(store))?
            .config(config.dispatcher_config());
        let builder = subscribe_projection(builder, open_tabs.clone());
        let dispatcher = subscribe_projection(builder, chef_todo_list.clone()).build();

        tracing::info!(
            replayed,
            conflict_retries = config.conflict_retries,
            "cafe ready"
        );

        Ok(Self {
            dispatcher,
            open_tabs,
            chef_todo_list,
        })
    }
}
