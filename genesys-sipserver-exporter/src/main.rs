//! Prometheus exporter for Genesys SIP Server.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use genesys_sipserver_exporter::config::LogFormat;
use genesys_sipserver_exporter::{ExporterConfig, HttpServer, Scraper, StatusFetcher};

/// Prometheus exporter for Genesys SIP Server.
#[derive(Parser, Debug)]
#[command(name = "genesys-sipserver-exporter")]
#[command(about = "Export Genesys SIP Server status pages as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error). Defaults to the config value.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // Override listen address from CLI
    if let Some(listen) = args.listen {
        config.http.listen = listen;
        config.validate()?;
    }

    // Initialize logging
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(config.logging.level.as_str())
        .parse()
        .unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("genesys_sipserver_exporter={}", log_level).parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!("Starting Genesys SIP Server exporter");

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Parse listen address
    let listen_addr = config
        .http
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    // Create components
    let fetcher = StatusFetcher::new(&config.upstream)
        .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
    let scraper = Arc::new(Scraper::new(fetcher));
    let http_server = HttpServer::new(scraper, listen_addr, config.http.path.clone());

    info!(
        status_path = %config.upstream.status_path,
        timeout_secs = config.upstream.timeout_secs,
        "Upstream settings"
    );

    // Start HTTP server
    let mut http_task = tokio::spawn(async move { http_server.run(shutdown_rx).await });

    // Wait for shutdown signal, or for the server to stop on its own
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
        result = &mut http_task => {
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!("HTTP server error: {}", e);
                    Err(e)
                }
                Err(e) => Err(anyhow::anyhow!("HTTP server task failed: {}", e)),
            };
        }
    }

    // Signal shutdown
    shutdown_tx.send(true)?;

    // Wait for the server to drain
    if tokio::time::timeout(Duration::from_secs(5), http_task)
        .await
        .is_err()
    {
        warn!("HTTP server did not stop within 5s");
    }

    info!("Exporter stopped");
    Ok(())
}

async fn terminate() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}
