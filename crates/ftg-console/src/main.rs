//! ftgate console demo - entry point.
//!
//! Runs the client runtime against the in-process sim gateway: connect,
//! login, subscribe, settlement confirmation, the day-open query chain,
//! and a short tick tape. Every callback is printed through tracing.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// ftgate console demo
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via FTG_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Instruments to subscribe, overriding the config file
    #[arg(short, long, value_delimiter = ',')]
    instruments: Option<Vec<String>>,

    /// How long to run the sim session, in seconds
    #[arg(short, long, default_value_t = 15)]
    duration: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    ftg_telemetry::init_logging()?;

    info!("Starting ftg console v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > FTG_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("FTG_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = ftg_console::AppConfig::load(Path::new(&config_path))?;
    if let Some(instruments) = args.instruments {
        config.gateway.instruments = instruments;
    }

    info!(
        md_address = %config.gateway.md_address,
        td_address = %config.gateway.td_address,
        instruments = ?config.gateway.instruments,
        "Configuration loaded"
    );

    let app = ftg_console::Application::new(config);
    app.run(Duration::from_secs(args.duration)).await?;

    Ok(())
}
