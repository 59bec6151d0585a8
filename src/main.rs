// src/main.rs
use anyhow::Result;
use arc_swap::ArcSwap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use app_health_aggregator::{
    aggregator::ApplicationHealthAggregator,
    api::ApplicationsApi,
    config::{self, Settings},
    health::HttpProber,
    metrics::MetricsRegistry,
    server::{start_metrics_server, RequestHandler, ServerBuilder},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("app_health_aggregator=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let settings = config::load_config(&config_path).await?;
    info!(
        "Loaded {} applications over {} health checks",
        settings.applications.len(),
        settings.health_checks.len()
    );

    // Metrics are optional; the aggregator only records when a collector is present
    let metrics = if settings.metrics.enabled {
        let registry = Arc::new(MetricsRegistry::new()?);
        let metrics_addr: SocketAddr = ([0, 0, 0, 0], settings.metrics.port).into();
        start_metrics_server(metrics_addr, registry.clone(), settings.metrics.path.clone())?;
        Some(registry.collector())
    } else {
        None
    };

    let prober = HttpProber::new(&settings.probe)?;
    let aggregator = ApplicationHealthAggregator::new(Arc::new(prober), metrics);

    let listen_addr = settings.server.listen_addr;
    let base_path = settings.server.base_path.clone();
    let shared = Arc::new(ArcSwap::from_pointee(settings));

    spawn_reload_on_hangup(config_path, shared.clone());

    let api = Arc::new(ApplicationsApi::new(shared, aggregator));
    let handler = RequestHandler::new(api, &base_path);

    info!("Serving application health on {}{}", listen_addr, base_path);

    ServerBuilder::new(listen_addr)
        .with_handler(handler)
        .serve(shutdown_signal())
        .await?;

    Ok(())
}

// Reload settings on SIGHUP. Queries already running keep their snapshot.
#[cfg(unix)]
fn spawn_reload_on_hangup(config_path: String, shared: Arc<ArcSwap<Settings>>) {
    tokio::spawn(async move {
        let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                warn!("SIGHUP reload disabled: {}", e);
                return;
            }
        };

        while hangup.recv().await.is_some() {
            match config::load_config(&config_path).await {
                Ok(settings) => {
                    info!(
                        "Reloaded configuration: {} applications",
                        settings.applications.len()
                    );
                    shared.store(Arc::new(settings));
                }
                Err(e) => error!("Configuration reload failed, keeping previous: {:#}", e),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_config_path: String, _shared: Arc<ArcSwap<Settings>>) {}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
