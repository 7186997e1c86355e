//! Client-side order book of record.
//!
//! - [`OrderTracker`]: allocates order references, merges gateway order
//!   pushes, fills and query pages, and decides which pushes are worth
//!   telling the application about
//! - [`PushOutcome`]: change/no-change verdict for one order push

pub mod tracker;

pub use tracker::{OrderTracker, PushOutcome};
