//! Client runtime for the futures trading gateway.
//!
//! Ties the building blocks together behind one handle:
//! - [`GatewayClient`]: the outbound request surface (sessions,
//!   subscriptions, queries, order entry) plus synchronous read accessors
//! - [`GatewayHandler`]: the application callback trait, driven by a
//!   single event-loop task that consumes the transport queue
//!
//! Construct a transport adapter, build the client over it, implement
//! `GatewayHandler`, then `start` the loop and `connect`. Every inbound
//! event is fully processed, derived callbacks included, before the next
//! one is taken; callbacks may call back into the client freely.

pub mod client;
pub mod config;
pub mod error;
pub mod handler;

mod event_loop;

pub use client::GatewayClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use handler::{GatewayHandler, NoopHandler};

pub use ftg_session::SessionState;
