//! Walk graph TCP service.
//!
//! [`serve`] runs the length-prefixed JSON protocol: a bounded pool of
//! connection tasks, each processing its requests in order, with every graph
//! operation executed on Tokio's blocking pool. [`admin_router`] builds the
//! HTTP listener for health probes, Prometheus metrics and graph statistics.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, info_span, warn, Span};

use walkgraph_lib::{AdmissionPolicy, CoordinatorSnapshot, NetworkStats};
use walkgraph_service_shared::{
    handle_payload, health_live, health_ready, metrics_handler, read_frame,
    record_connection_closed, record_connection_opened, write_json, AppState, FrameError,
    MetricsConfig, MetricsLayer, ProblemDetails, RequestId, Response, ServiceConfig, ServiceResponse,
    DEFAULT_MAX_FRAME_BYTES,
};

/// Limits applied by [`serve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeOptions {
    /// Connections served at once; further clients wait in the accept queue.
    pub max_connections: usize,
    pub max_frame_bytes: usize,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            max_connections: walkgraph_service_shared::config::DEFAULT_MAX_CONNECTIONS,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl From<&ServiceConfig> for ServeOptions {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            max_frame_bytes: config.max_frame_bytes,
        }
    }
}

/// Accept and serve protocol connections until `shutdown` resolves.
///
/// A connection slot is reserved before `accept` is called, so when all
/// `max_connections` slots are busy new clients stay in the listen backlog.
/// Connections already running when shutdown fires are left to finish.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    options: ServeOptions,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let slots = Arc::new(Semaphore::new(options.max_connections));
    tokio::pin!(shutdown);

    info!(
        addr = %listener.local_addr()?,
        max_connections = options.max_connections,
        "protocol listener ready"
    );

    loop {
        let permit = tokio::select! {
            _ = &mut shutdown => break,
            permit = Arc::clone(&slots).acquire_owned() => permit.map_err(std::io::Error::other)?,
        };

        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            },
        };

        let state = state.clone();
        tokio::spawn(async move {
            let _permit = permit;
            serve_connection(stream, peer, state, options.max_frame_bytes).await;
        });
    }

    info!("protocol listener stopped");
    Ok(())
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, state: AppState, max_frame_bytes: usize) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(%peer, error = %e, "could not disable Nagle");
    }
    let (mut reader, mut writer) = stream.into_split();

    record_connection_opened();
    debug!(%peer, "connection opened");
    let served = process_frames(&mut reader, &mut writer, &state, max_frame_bytes).await;
    record_connection_closed();
    debug!(%peer, requests = served, "connection closed");
}

/// Answer frames from `reader` on `writer` until the peer stops or the stream
/// breaks. Returns the number of requests answered.
pub async fn process_frames<R, W>(
    reader: &mut R,
    writer: &mut W,
    state: &AppState,
    max_frame_bytes: usize,
) -> usize
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut served = 0;
    loop {
        let payload = match read_frame(reader, max_frame_bytes).await {
            Ok(Some(payload)) => payload,
            Ok(None) => break,
            Err(FrameError::TooLarge { len, max }) => {
                let request_id = RequestId::generate();
                warn!(%request_id, len, max, "oversized frame, closing connection");
                let problem = ProblemDetails::bad_request(
                    format!("frame of {len} bytes exceeds the {max} byte limit"),
                    request_id.as_str(),
                );
                // The peer is dropped either way.
                let _ = write_json(writer, &Response::error(problem)).await;
                break;
            }
            Err(e) => {
                debug!(error = %e, "connection ended mid-frame");
                break;
            }
        };

        let request_id = RequestId::generate();
        let span = info_span!("request", %request_id);
        let response = execute(state.clone(), payload, request_id, span).await;

        if let Err(e) = write_json(writer, &response).await {
            debug!(error = %e, "failed to write reply");
            break;
        }
        served += 1;
    }
    served
}

async fn execute(state: AppState, payload: Vec<u8>, request_id: RequestId, span: Span) -> Response {
    let id = request_id.to_string();
    let task = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        handle_payload(state.network(), &payload, &id)
    });

    match task.await {
        Ok(response) => response,
        Err(e) => {
            error!(%request_id, error = %e, "request task failed");
            Response::error(ProblemDetails::internal_error(
                "the request could not be completed",
                request_id.as_str(),
            ))
        }
    }
}

/// Body of `GET /api/v1/stats`.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub graph: NetworkStats,
    pub coordinator: CoordinatorSnapshot,
    pub policy: AdmissionPolicy,
    pub uptime_seconds: u64,
}

async fn stats_handler(State(state): State<AppState>) -> ServiceResponse<StatsReport> {
    let network = state.network();
    ServiceResponse::new(StatsReport {
        graph: network.stats(),
        coordinator: network.coordinator().snapshot(),
        policy: network.coordinator().policy(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Admin HTTP routes. The metrics endpoint is mounted at `metrics.path`
/// unless metrics are disabled.
pub fn admin_router(state: AppState, metrics: &MetricsConfig) -> Router {
    let mut router = Router::new()
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/api/v1/stats", get(stats_handler));
    if metrics.enabled {
        let path = if metrics.path.starts_with('/') {
            metrics.path.as_str()
        } else {
            warn!(path = %metrics.path, "metrics path must start with '/', using /metrics");
            "/metrics"
        };
        router = router.route(path, get(metrics_handler));
    }

    router
        .layer(MetricsLayer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
