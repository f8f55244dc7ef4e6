//! Cafe entry point: runs a scripted service against an in-memory store.

use app::{AppError, Cafe, Config, LogFormat, run_service_day};
use event_store::InMemoryEventStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env()?;
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Create event store and wire the cafe
    let cafe = Cafe::bootstrap(InMemoryEventStore::new(), &config).await?;

    // 4. Run the service
    let summary = run_service_day(&cafe).await?;
    tracing::info!(
        tabs_opened = summary.tabs_opened,
        tabs_closed = summary.tabs_closed,
        takings = %summary.takings,
        tips = %summary.tips,
        open_tables = ?summary.open_tables,
        "service finished"
    );

    // 5. Report metrics
    tracing::info!(metrics = %metrics_handle.render(), "final metrics");

    Ok(())
}
