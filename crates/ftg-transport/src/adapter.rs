//! The transport adapter seam.

use crate::error::TransportResult;
use crate::request::OutboundRequest;

/// Boundary to the underlying session layer.
///
/// Implementations own sockets, heartbeats, and reconnection; they deliver
/// inbound traffic as `TransportEvent`s through the queue handed to them at
/// construction. Both methods are fire-and-forget: results surface later as
/// events, and errors here mean the request never left the process.
///
/// Implementations must be callable from within application callbacks
/// running on the event-loop task.
pub trait GatewayTransport: Send + Sync {
    /// Begin connecting both fronts. Connectivity is reported via
    /// `TransportEvent::FrontConnected`.
    fn connect(&self) -> TransportResult<()>;

    /// Submit a request toward the gateway.
    fn send(&self, request: OutboundRequest) -> TransportResult<()>;
}
