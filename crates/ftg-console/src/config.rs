//! Application configuration.

use std::path::Path;

use serde::Deserialize;

use ftg_client::ClientConfig;
use ftg_transport::{ConnectionConfig, Credentials, Password};

use crate::error::{AppError, AppResult};

/// Gateway endpoints, identity, and the subscription list.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Market-data front address.
    #[serde(default = "default_md_address")]
    pub md_address: String,
    /// Trading front address.
    #[serde(default = "default_td_address")]
    pub td_address: String,
    #[serde(default = "default_broker_id")]
    pub broker_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub password: Password,
    /// Session working directory. Empty means a fresh temp dir per run.
    #[serde(default)]
    pub flow_path: String,
    /// Instruments subscribed at startup.
    #[serde(default = "default_instruments")]
    pub instruments: Vec<String>,
}

fn default_md_address() -> String {
    "tcp://180.168.146.187:10131".to_string()
}

fn default_td_address() -> String {
    "tcp://180.168.146.187:10130".to_string()
}

fn default_broker_id() -> String {
    "9999".to_string()
}

fn default_instruments() -> Vec<String> {
    vec!["IF2609".to_string()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            md_address: default_md_address(),
            td_address: default_td_address(),
            broker_id: default_broker_id(),
            user_id: String::new(),
            password: Password::default(),
            flow_path: String::new(),
            instruments: default_instruments(),
        }
    }
}

/// Reconnect policy subset handed to the transport.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Maximum reconnection attempts (0 = infinite).
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    /// Base delay for reconnection backoff (ms).
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for reconnection backoff (ms).
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60000
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub client: ClientConfig,
    pub transport: TransportConfig,
}

impl AppConfig {
    /// Load configuration, falling back to defaults when the file does not
    /// exist.
    pub fn load(path: &Path) -> AppResult<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Transport connection settings assembled from the gateway and
    /// transport sections.
    #[must_use]
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            md_address: self.gateway.md_address.clone(),
            td_address: self.gateway.td_address.clone(),
            max_reconnect_attempts: self.transport.max_reconnect_attempts,
            reconnect_base_delay_ms: self.transport.reconnect_base_delay_ms,
            reconnect_max_delay_ms: self.transport.reconnect_max_delay_ms,
        }
    }

    /// Login identity for the session.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            broker_id: self.gateway.broker_id.clone(),
            user_id: self.gateway.user_id.clone(),
            password: self.gateway.password.clone(),
        }
    }

    /// Configured flow path, or `None` for a fresh temp dir.
    #[must_use]
    pub fn flow_path(&self) -> Option<&Path> {
        if self.gateway.flow_path.is_empty() {
            None
        } else {
            Some(Path::new(&self.gateway.flow_path))
        }
    }
}
