use thiserror::Error;

use crate::client::api::ApiClientError;
use crate::config::LoadError;
use crate::infra::store::StoreError;
use crate::infra::telemetry::TelemetryError;

/// Top-level failure surfaced by the binary entry points.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Client(#[from] ApiClientError),
    #[error("server error: {0}")]
    Server(std::io::Error),
}
