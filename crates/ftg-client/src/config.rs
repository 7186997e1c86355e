//! Client runtime configuration.

use serde::Deserialize;
use std::time::Duration;

/// Event loop and request pacing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Quiet time before the idle callback fires.
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,
    /// Capacity of the inbound raw-event queue.
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
    /// Minimum spacing between outbound queries. The gateway throttles
    /// query traffic; requests issued faster than this are scheduled into
    /// later slots rather than rejected.
    #[serde(default = "default_query_spacing_ms")]
    pub query_spacing_ms: u64,
}

fn default_idle_delay_ms() -> u64 {
    1000
}

fn default_event_queue_capacity() -> usize {
    1024
}

fn default_query_spacing_ms() -> u64 {
    1200
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            idle_delay_ms: default_idle_delay_ms(),
            event_queue_capacity: default_event_queue_capacity(),
            query_spacing_ms: default_query_spacing_ms(),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    #[must_use]
    pub fn query_spacing(&self) -> Duration {
        Duration::from_millis(self.query_spacing_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.idle_delay(), Duration::from_millis(1000));
        assert_eq!(config.event_queue_capacity, 1024);
        assert_eq!(config.query_spacing(), Duration::from_millis(1200));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str("idle_delay_ms = 250").unwrap();
        assert_eq!(config.idle_delay_ms, 250);
        assert_eq!(config.query_spacing_ms, 1200);
    }
}
