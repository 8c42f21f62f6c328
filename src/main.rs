//! mavlink-watchdog — liveness watchdog for a MAVLink telemetry relay.
//!
//! # Usage
//!
//! ```bash
//! # Run with the deployment config file
//! mavlink-watchdog
//!
//! # Override the probed port and monitored unit
//! mavlink-watchdog --port 14600 --service mavproxy
//! ```
//!
//! # Environment Variables
//!
//! - `MAVWD_CONFIG`: Path to the key-value config file (default: /opt/mavlink/config.env)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use mavlink_watchdog::config::defaults;
use mavlink_watchdog::{Monitor, MonitorConfig, SystemdController, UdpProbe};

#[derive(Parser, Debug)]
#[command(name = "mavlink-watchdog")]
#[command(about = "Liveness watchdog for a MAVLink telemetry relay service")]
#[command(version)]
struct CliArgs {
    /// Path to the key-value config file (overrides MAVWD_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the relay control port to probe
    #[arg(long)]
    port: Option<u16>,

    /// Override the monitored systemd unit
    #[arg(long)]
    service: Option<String>,

    /// Override the silence threshold in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

/// Wait for an external stop request: Ctrl+C, or SIGTERM as sent by
/// `systemctl stop` when the watchdog itself runs as a unit.
async fn stop_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.ok();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut config = MonitorConfig::load(args.config.as_deref())
        .context("Failed to load watchdog configuration")?;

    // CLI overrides take precedence over the config file
    if let Some(port) = args.port {
        config.probe_port = port;
    }
    if let Some(service) = args.service {
        config.service_name = service;
    }
    if let Some(secs) = args.timeout_secs {
        config.silence_threshold = Duration::from_secs(secs);
    }
    config
        .validate()
        .context("Invalid watchdog configuration")?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  mavlink-watchdog — MAVLink relay liveness monitor");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Graceful shutdown via SIGINT or SIGTERM
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        stop_signal().await;
        info!("Received stop signal, initiating shutdown...");
        shutdown_token.cancel();
    });

    let probe = UdpProbe::new(
        config.probe_port,
        Duration::from_secs(defaults::PROBE_REQUEST_TIMEOUT_SECS),
    );
    let controller = SystemdController::new();

    Monitor::new(config, probe, controller).run(cancel_token).await;

    info!("mavlink-watchdog shutdown complete");
    Ok(())
}
