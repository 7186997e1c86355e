//! Prometheus metrics and structured logging for ftgate.
//!
//! - Structured JSON logging with tracing
//! - Prometheus metrics for connectivity, event-loop throughput, bars,
//!   queries, and order lifecycle callbacks

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::{gather_text, Metrics};
