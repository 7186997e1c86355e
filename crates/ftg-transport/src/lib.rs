//! Transport boundary for the ftgate client runtime.
//!
//! This crate defines the seam between the runtime core and the session
//! layer that owns sockets and heartbeats:
//! - `GatewayTransport`: the outbound trait the client calls
//! - `TransportEvent`: the typed inbound event stream
//! - `ConnectionConfig`: reconnect/backoff policy (adapter-owned)
//! - `SimTransport`/`SimGateway`: in-process adapter for tests and demos
//! - flow-path helpers for the session layer's working directory

pub mod adapter;
pub mod connection;
pub mod error;
pub mod event;
pub mod flow_path;
pub mod request;
pub mod sim;

pub use adapter::GatewayTransport;
pub use connection::{ConnectionConfig, Credentials, Password};
pub use error::{TransportError, TransportResult};
pub use event::{DisconnectReason, QueryPayload, TransportEvent};
pub use flow_path::{prepare_flow_path, remove_flow_path};
pub use request::OutboundRequest;
pub use sim::{sim_pair, SimGateway, SimTransport};
