//! Application orchestration.
//!
//! Wires the client runtime to the sim transport, spawns the gateway
//! script, runs for the requested duration, then drains and joins the
//! event loop before cleaning up the flow path.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{info, warn};

use ftg_client::GatewayClient;
use ftg_transport::{prepare_flow_path, remove_flow_path, sim_pair};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::handler::ConsoleHandler;
use crate::script::GatewayScript;

/// Main application.
pub struct Application {
    config: AppConfig,
}

impl Application {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run the sim session for `duration`, then shut down cleanly.
    pub async fn run(self, duration: Duration) -> AppResult<()> {
        // A configured flow path outlives the run; a defaulted temp dir
        // is removed at the end.
        let keep_flow_path = self.config.flow_path().is_some();
        let flow_root = prepare_flow_path(self.config.flow_path())?;
        info!(path = %flow_root.display(), "flow path ready");

        let (event_tx, event_rx) = mpsc::channel(self.config.client.event_queue_capacity);
        let (transport, gateway) = sim_pair(self.config.connection_config(), event_tx);

        let client = GatewayClient::new(Arc::new(transport), self.config.client.clone())?;
        let loop_handle = client.start(event_rx, Box::new(ConsoleHandler::new(client.clone())));

        let trading_day = Local::now().format("%Y%m%d").to_string();
        let instrument = self
            .config
            .gateway
            .instruments
            .first()
            .cloned()
            .unwrap_or_else(|| "IF2609".to_string());
        let script = GatewayScript::new(&self.config.credentials(), trading_day, instrument);
        let script_handle = tokio::spawn(script.run(gateway));

        client.connect()?;
        client.subscribe(&self.config.gateway.instruments)?;

        tokio::select! {
            _ = tokio::time::sleep(duration) => info!("demo duration elapsed"),
            _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
        }

        client.exit();
        if let Err(e) = loop_handle.await {
            warn!(error = %e, "event loop task failed");
        }
        script_handle.abort();

        for instrument in &self.config.gateway.instruments {
            if let Some(bar) = client.last_closed_bar(instrument) {
                info!(%bar, "last closed bar");
            }
        }
        info!(
            trading_day = ?client.trading_day(),
            orders = client.orders().len(),
            "session complete"
        );

        if keep_flow_path {
            info!(path = %flow_root.display(), "keeping configured flow path");
        } else {
            remove_flow_path(&flow_root)?;
        }
        Ok(())
    }
}
