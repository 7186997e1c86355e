//! Connection configuration and reconnect policy.
//!
//! The adapter owns retry timing; the core only observes
//! FrontConnected/FrontDisconnected. Backoff is exponential with jitter,
//! capped at a configurable maximum.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Login password, wiped from memory on drop and redacted in logs.
#[derive(Clone, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password(***)")
    }
}

impl Default for Password {
    fn default() -> Self {
        Self(String::new())
    }
}

/// Gateway login credentials, shared by both channels.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub broker_id: String,
    pub user_id: String,
    pub password: Password,
}

/// Transport connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Market-data front address.
    pub md_address: String,
    /// Trading front address.
    pub td_address: String,
    /// Maximum reconnection attempts (0 = infinite).
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            md_address: String::new(),
            td_address: String::new(),
            max_reconnect_attempts: 0, // Infinite
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

impl ConnectionConfig {
    /// Backoff delay before reconnect attempt `attempt` (1-based).
    ///
    /// base * 2^(attempt-1), capped at the configured maximum, plus
    /// 0-1000 ms of jitter.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(10);
        let delay = self.reconnect_base_delay_ms.saturating_mul(1u64 << exponent);
        let delay = delay.min(self.reconnect_max_delay_ms);

        Duration::from_millis(delay + rand_jitter())
    }

    /// Returns true if another reconnect attempt is allowed.
    #[must_use]
    pub fn may_retry(&self, attempt: u32) -> bool {
        self.max_reconnect_attempts == 0 || attempt < self.max_reconnect_attempts
    }
}

/// Generate random jitter (0-1000ms).
fn rand_jitter() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as u64
}
