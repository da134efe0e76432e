//! transmission-exporter — Prometheus exporter for the Transmission daemon.
//!
//! Single binary that wires the exporter together:
//! - RPC client to the daemon
//! - Instruments + collection loop
//! - `/metrics` scrape endpoint
//!
//! # Usage
//!
//! ```text
//! TRANSMISSION_HOST=seedbox EXPORTER_COLLECT_INTERVAL=15 transmission-exporter
//! transmission-exporter --transmission-host seedbox --listen-port 9190
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::{error, info};

use exporter_core::config::{
    DEFAULT_COLLECT_INTERVAL_SECS, DEFAULT_LISTEN_PORT, DEFAULT_METRIC_NAMESPACE,
    DEFAULT_RPC_PATH, DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_TRANSMISSION_HOST,
    DEFAULT_TRANSMISSION_PORT,
};
use exporter_core::{Credentials, ExporterConfig, LogFormat, RpcEndpoint};
use exporter_metrics::{Collector, MetricsRegistry, TransmissionMetrics};
use exporter_rpc::TransmissionClient;

#[derive(Parser)]
#[command(
    name = "transmission-exporter",
    about = "Prometheus exporter for the Transmission daemon"
)]
struct Cli {
    /// Seconds between two metrics collections.
    #[arg(long, env = "EXPORTER_COLLECT_INTERVAL", default_value_t = DEFAULT_COLLECT_INTERVAL_SECS)]
    collect_interval: u64,

    /// Prefix for all metric names.
    #[arg(long, env = "METRIC_NAMESPACE", default_value = DEFAULT_METRIC_NAMESPACE)]
    metric_namespace: String,

    #[arg(long, env = "TRANSMISSION_HOST", default_value = DEFAULT_TRANSMISSION_HOST)]
    transmission_host: String,

    #[arg(long, env = "TRANSMISSION_PORT", default_value_t = DEFAULT_TRANSMISSION_PORT)]
    transmission_port: u16,

    #[arg(long, env = "TRANSMISSION_USERNAME")]
    transmission_username: Option<String>,

    #[arg(long, env = "TRANSMISSION_PASSWORD", hide_env_values = true)]
    transmission_password: Option<String>,

    #[arg(long, env = "TRANSMISSION_RPC_PATH", default_value = DEFAULT_RPC_PATH)]
    transmission_rpc_path: String,

    /// RPC request timeout in seconds.
    #[arg(long, env = "TRANSMISSION_TIMEOUT", default_value_t = DEFAULT_RPC_TIMEOUT_SECS)]
    transmission_timeout: u64,

    /// Port of the /metrics endpoint.
    #[arg(long, env = "EXPORTER_PORT", default_value_t = DEFAULT_LISTEN_PORT)]
    listen_port: u16,

    #[arg(long, env = "EXPORTER_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Text)]
    log_format: LogFormatArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl Cli {
    fn into_config(self) -> ExporterConfig {
        let credentials =
            Credentials::from_parts(self.transmission_username, self.transmission_password);
        let rpc = RpcEndpoint {
            path: self.transmission_rpc_path,
            timeout: Duration::from_secs(self.transmission_timeout),
            ..RpcEndpoint::new(self.transmission_host, self.transmission_port)
        }
        .with_credentials(credentials);

        ExporterConfig {
            collect_interval: Duration::from_secs(self.collect_interval),
            metric_namespace: self.metric_namespace,
            rpc,
            listen_port: self.listen_port,
            log_format: match self.log_format {
                LogFormatArg::Text => LogFormat::Text,
                LogFormatArg::Json => LogFormat::Json,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();
    init_tracing(config.log_format);
    config.validate()?;
    run(config).await
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,transmission_exporter=debug,exporter_metrics=debug",
        )
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.rpc.host,
        port = config.rpc.port,
        "transmission exporter starting"
    );

    // ── Instruments ────────────────────────────────────────────

    let registry = MetricsRegistry::new();
    let metrics = TransmissionMetrics::new(&registry, &config.metric_namespace)?;
    info!(namespace = %config.metric_namespace, "instruments registered");

    // ── Daemon connection ──────────────────────────────────────

    // Nothing is served until the daemon is reachable.
    let client = match TransmissionClient::connect(&config.rpc).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, url = %config.rpc.url(), "cannot connect to transmission");
            return Err(e).with_context(|| format!("connecting to {}", config.rpc.url()));
        }
    };

    // ── Collection loop ────────────────────────────────────────

    let collector = Collector::new(client, metrics, config.collect_interval);
    info!(interval = collector.interval().as_secs(), "collector initialized");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let collector_handle = tokio::spawn(async move {
        collector.run(shutdown_rx).await;
    });

    // ── Scrape endpoint ────────────────────────────────────────

    let router = exporter_api::build_router(registry);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "metrics endpoint listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = collector_handle.await;

    info!("transmission exporter stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
