//! Application error types.

use cafe::TabError;
use domain::{DispatchError, RegistrationError};
use projections::ProjectionError;
use thiserror::Error;

/// Failures that stop the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Handler registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Command failed: {0}")]
    Dispatch(#[from] DispatchError<TabError>),

    #[error("Projection catch-up failed: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Service went off script: {0}")]
    Script(String),

    #[error("Failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}
