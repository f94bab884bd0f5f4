//! Walk graph TCP service.
//!
//! Clients send length-prefixed JSON requests on the service port to record
//! walks and query shortest and total path lengths.
//!
//! # Admin endpoints
//!
//! - `GET /health/live` - liveness probe
//! - `GET /health/ready` - readiness probe (fails while a reset holds the graph)
//! - `GET /metrics` - Prometheus metrics
//! - `GET /api/v1/stats` - graph size and coordinator state
//!
//! # Configuration
//!
//! - `SERVICE_PORT` - protocol port (default: 12345)
//! - `ADMIN_PORT` - admin HTTP port, `0` disables it (default: 9090)
//! - `MAX_CONNECTIONS`, `MAX_FRAME_BYTES`, `ADMISSION_POLICY`,
//!   `ADMISSION_TIMEOUT_MS`, `CELL_SIZE`, `MATCH_RADIUS`
//! - `RUST_LOG` - log level (default: info)
//! - `LOG_FORMAT` - json (default) or text

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use walkgraph_service::{admin_router, serve, ServeOptions};
use walkgraph_service_shared::{
    init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig, ServiceConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("walkgraph-service");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let config = ServiceConfig::from_env().map_err(|e| {
        error!(error = %e, "invalid configuration");
        e
    })?;

    info!(
        port = config.service_port,
        admin_port = ?config.admin_port,
        max_connections = config.max_connections,
        policy = ?config.network.policy,
        "starting walkgraph service"
    );

    let state = AppState::new(config.network.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let admin = match config.admin_port {
        Some(port) => {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = TcpListener::bind(addr).await?;
            info!(addr = %addr, "admin listener ready");

            let app = admin_router(state.clone(), &metrics_config);
            let mut rx = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                let stopped = async move {
                    let _ = rx.wait_for(|stop| *stop).await;
                };
                if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(stopped).await {
                    error!(error = %e, "admin listener failed");
                }
            }))
        }
        None => None,
    };

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(e) => {
                error!(error = %e, "failed to listen for ctrl-c, running until killed");
                std::future::pending::<()>().await;
            }
        }
        let _ = shutdown_tx.send(true);
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.service_port));
    let listener = TcpListener::bind(addr).await?;

    let mut rx = shutdown_rx;
    let stopped = async move {
        let _ = rx.wait_for(|stop| *stop).await;
    };
    serve(listener, state, ServeOptions::from(&config), stopped).await?;

    if let Some(admin) = admin {
        let _ = admin.await;
    }

    Ok(())
}
