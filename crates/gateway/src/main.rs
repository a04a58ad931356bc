//! Appointment watcher entry point.
//!
//! Wires the SNCT client, the dispatcher, the periodic refresh service and
//! the HTTP/WebSocket transport into one process.

use anyhow::Result;
use dispatcher::{Dispatcher, RefreshConfig, RefreshService};
use gateway::{create_router, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use upstream::{SnctClient, SnctClientConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("starting appointment watcher");

    // Read configuration from environment
    let base_url =
        env::var("SNCT_BASE_URL").unwrap_or_else(|_| "https://rdv.snct.lu".to_string());
    let http_port: u16 = env::var("HTTP_PORT")
        .unwrap_or_else(|_| "5000".to_string())
        .parse()
        .expect("HTTP_PORT must be a number");
    let metrics_port: u16 = env::var("METRICS_PORT")
        .unwrap_or_else(|_| "9090".to_string())
        .parse()
        .expect("METRICS_PORT must be a number");
    let refresh_interval_secs: u64 = env::var("REFRESH_INTERVAL_SECS")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .expect("REFRESH_INTERVAL_SECS must be a number");
    let fetch_concurrency: usize = env::var("FETCH_CONCURRENCY")
        .unwrap_or_else(|_| "10".to_string())
        .parse()
        .expect("FETCH_CONCURRENCY must be a number");
    let fetch_timeout_secs: u64 = env::var("FETCH_TIMEOUT_SECS")
        .unwrap_or_else(|_| "10".to_string())
        .parse()
        .expect("FETCH_TIMEOUT_SECS must be a number");

    info!("configuration:");
    info!("  SNCT_BASE_URL: {base_url}");
    info!("  HTTP_PORT: {http_port}");
    info!("  METRICS_PORT: {metrics_port}");
    info!("  REFRESH_INTERVAL_SECS: {refresh_interval_secs}");
    info!("  FETCH_CONCURRENCY: {fetch_concurrency}");
    info!("  FETCH_TIMEOUT_SECS: {fetch_timeout_secs}");

    // Start Prometheus metrics server
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], metrics_port))
        .install()
        .expect("failed to start Prometheus exporter");
    info!("prometheus metrics server started on port {metrics_port}");

    // Provider client and dispatcher
    let client = SnctClient::new(SnctClientConfig {
        base_url,
        concurrency: fetch_concurrency,
        timeout: Duration::from_secs(fetch_timeout_secs),
        ..SnctClientConfig::default()
    })?;
    let dispatcher = Arc::new(Dispatcher::new());

    // Spawn the refresh service
    let (refresh_shutdown_tx, refresh_shutdown_rx) = mpsc::channel(1);
    let service = Arc::new(RefreshService::new(
        dispatcher.clone(),
        client,
        RefreshConfig {
            interval: Duration::from_secs(refresh_interval_secs),
        },
    ));
    let refresh_handle = tokio::spawn(async move {
        if let Err(err) = service.run(refresh_shutdown_rx).await {
            error!("refresh service failed: {err:?}");
        }
    });

    // Stream-close channel: flipped on shutdown, watched by every connection
    let (close_tx, close_rx) = watch::channel(false);

    let state = Arc::new(AppState {
        dispatcher,
        shutdown: close_rx,
    });
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = TcpListener::bind(addr).await?;
    info!("gateway listening on {addr}");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(refresh_shutdown_tx, close_tx))
        .await?;

    let _ = refresh_handle.await;
    info!("appointment watcher stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then stop the refresh loop (abandoning any
/// in-flight cycle) and close every open subscription stream so the server
/// can drain.
async fn shutdown_signal(refresh_shutdown_tx: mpsc::Sender<()>, close_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received terminate signal"),
    }

    let _ = refresh_shutdown_tx.send(()).await;
    let _ = close_tx.send(true);
}
