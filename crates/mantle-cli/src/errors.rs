//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use mantle_dispatch::DispatchError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to assemble the component graph: {0}")]
    Assemble(#[source] DispatchError),
    #[error("proxied call failed: {0}")]
    Dispatch(#[source] DispatchError),
    #[error("failed to serialise report: {0}")]
    SerialiseReport(serde_json::Error),
    #[error("failed to write report: {0}")]
    WriteReport(io::Error),
}
