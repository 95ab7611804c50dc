use anyhow::{Context, Result};
use availability_monitor::{load_endpoints, HealthMonitor, MonitorConfig, ReqwestHttpClient};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Periodically probes HTTP endpoints and reports availability per domain.
#[derive(Parser, Debug)]
#[command(name = "availability-monitor")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    MONITOR_REQUEST_TIMEOUT_MS    Per-request timeout (default: 500)
    MONITOR_CHECK_INTERVAL_SECS   Delay between rounds (default: 15)
    MONITOR_DEFAULT_METHOD        Method for endpoints without one (default: GET)
    MONITOR_PROBE_MODE            sequential | concurrent (default: sequential)
    MONITOR_PROBE_BODY            descriptor | template (default: descriptor)
    RUST_LOG                      Log filter (default: availability_monitor=info,reqwest=warn)
"#)]
struct Cli {
    /// YAML file listing the endpoints to monitor
    config_file: PathBuf,
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "availability_monitor=info,reqwest=warn".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = MonitorConfig::from_env().context("invalid monitor configuration")?;
    config.log_configuration();

    let endpoints = load_endpoints(&cli.config_file)?;
    info!(
        endpoints = endpoints.len(),
        path = %cli.config_file.display(),
        "Loaded endpoints"
    );

    let http_client = Box::new(
        ReqwestHttpClient::new(config.request_timeout).context("failed to build HTTP client")?,
    );
    let monitor = HealthMonitor::new(endpoints, http_client, config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Keep the sender alive so the monitor does not read this as shutdown.
            error!("Failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested, stopping after the current round");
        let _ = shutdown_tx.send(true);
    });

    monitor.run(&mut std::io::stdout(), shutdown_rx).await?;

    Ok(())
}
