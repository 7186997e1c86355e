//! Console demo for the ftgate client runtime.
//!
//! Wires a [`ftg_client::GatewayClient`] to the in-process sim transport,
//! scripts the gateway side of a conventional session, and prints every
//! callback:
//! - Fronts come up, then logins and subscriptions are acked
//! - Settlement confirmation triggers the day-open query chain
//! - A short tick tape crosses a minute boundary so a closed bar appears

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod script;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use handler::ConsoleHandler;
