//! Gas-monitor bridge - Entry Point

use anyhow::Result;
use clap::Parser;
use gasbridge::{AppConfig, Application};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Bridge between an MQTT gas-monitor device and live dashboard clients
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via GASBRIDGE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI arg > GASBRIDGE_CONFIG env var > default
    let config_path = AppConfig::resolve_path(args.config);
    let loaded = AppConfig::load(&config_path)?;
    let found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();
    config.apply_env_overrides()?;

    gasbridge_telemetry::init_logging(&config.telemetry.log_level)?;

    info!("Starting gasbridge v{}", env!("CARGO_PKG_VERSION"));
    if found {
        info!(config_path = %config_path, "Configuration loaded");
    } else {
        warn!(config_path = %config_path, "Config file not found, using defaults");
    }
    info!(
        broker = %format!("{}:{}", config.bus.host, config.bus.port),
        prefix = %config.bus.topic_prefix,
        http_port = config.dashboard.port,
        "Effective configuration"
    );

    let app = Application::new(config)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                signal_token.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    app.run(shutdown).await?;

    info!("gasbridge stopped");
    Ok(())
}
