//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client error: {0}")]
    Client(#[from] ftg_client::ClientError),

    #[error("Transport error: {0}")]
    Transport(#[from] ftg_transport::TransportError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] ftg_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
