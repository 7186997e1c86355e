//! Session lifecycle and request correlation.
//!
//! This crate keeps the per-channel authentication machines and the
//! request id bookkeeping that pairs outbound queries with their
//! response pages:
//!
//! - [`SessionManager`]: Disconnected → Connecting → Authenticating →
//!   Ready, with subscription replay on market data login and settlement
//!   confirmation on trading login
//! - [`RequestCorrelator`]: monotonically increasing ids per channel,
//!   reset when the channel drops so a fresh session starts from 1

pub mod correlator;
pub mod manager;

pub use correlator::{CompleteOutcome, PendingRequest, RequestCorrelator};
pub use manager::{SessionManager, SessionState};
