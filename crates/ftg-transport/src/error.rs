//! Transport error types.

use ftg_core::Channel;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network failure")]
    NetworkFailure,

    #[error("Request queue full")]
    QueueFull,

    #[error("Requests sent too frequently")]
    TooFrequent,

    #[error("Channel {0} not connected")]
    NotConnected(Channel),

    #[error("Event channel closed")]
    EventChannelClosed,

    #[error("Flow path error: {0}")]
    FlowPath(String),

    #[error("Unknown gateway return code: {0}")]
    Unknown(i32),
}

impl TransportError {
    /// Map a gateway request return code to an error.
    ///
    /// The gateway convention: 0 accepted, -1 network failure, -2 request
    /// queue full, -3 flow control (too many requests per second).
    pub fn check_return_code(rc: i32) -> TransportResult<()> {
        match rc {
            0 => Ok(()),
            -1 => Err(Self::NetworkFailure),
            -2 => Err(Self::QueueFull),
            -3 => Err(Self::TooFrequent),
            other => Err(Self::Unknown(other)),
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
