//! Error types for ftg-client.

use thiserror::Error;

use ftg_core::{Channel, CoreError, OrderRef};
use ftg_transport::TransportError;

/// Client error types.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The channel's session is not logged in; the request was not sent.
    #[error("{0} session is not ready")]
    NotReady(Channel),

    /// No tokio runtime reachable from the constructing thread.
    #[error("No tokio runtime available to the client")]
    NoRuntime,

    /// The referenced order is not tracked by this client.
    #[error("Unknown order reference: {0}")]
    UnknownOrder(OrderRef),

    /// The order request failed local validation.
    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] CoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;
