//! Minute bar aggregation for the market data stream.
//!
//! - [`BarAggregator`]: per-instrument bar builder driven by depth
//!   snapshots in arrival order
//! - [`BarUpdate`]: the tick view plus the partial/closed bars one
//!   snapshot produced

pub mod aggregator;

pub use aggregator::{BarAggregator, BarUpdate};
