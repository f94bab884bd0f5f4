//! Prometheus metrics for the walk graph service.
//!
//! - [`MetricsConfig`]: whether to install the recorder and where to serve it
//! - [`init_metrics`]: install the global Prometheus recorder
//! - [`metrics_handler`]: axum handler for the `/metrics` endpoint
//! - Business metric helpers for walks, queries, resets and connections
//!
//! # Example
//!
//! ```no_run
//! use walkgraph_service_shared::metrics::{init_metrics, metrics_handler, MetricsConfig};
//! use axum::{routing::get, Router};
//!
//! init_metrics(&MetricsConfig::default()).expect("failed to initialize metrics");
//! let app: Router = Router::new().route("/metrics", get(metrics_handler));
//! ```

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkgraph_lib::{AdmissionObserver, Group, NetworkStats, WalkSummary};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Configuration for the metrics system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Path for the metrics endpoint.
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// - `METRICS_ENABLED`: anything but `false`/`0` enables (default: true)
    /// - `METRICS_PATH`: endpoint path (default: `/metrics`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup("METRICS_ENABLED")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0"))
            .unwrap_or(true);
        let path = lookup("METRICS_PATH").unwrap_or_else(|| "/metrics".to_string());
        Self { enabled, path }
    }
}

/// Errors that can occur during metrics initialization.
#[derive(Debug, Clone, Error)]
pub enum MetricsError {
    #[error("metrics are disabled")]
    Disabled,
    #[error("metrics recorder already initialized")]
    AlreadyInitialized,
    #[error("failed to install metrics recorder: {0}")]
    InstallFailed(String),
}

/// Install the Prometheus recorder. Must be called once, before any metric is
/// recorded; later calls fail with [`MetricsError::AlreadyInitialized`].
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }
    if PROMETHEUS_HANDLE.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Returns `None` if [`init_metrics`] has not been called.
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Prometheus exposition text.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Record a successfully stored walk.
///
/// Increments `walkgraph_walks_recorded_total` and adds each leg to
/// `walkgraph_edges_recorded_total`.
pub fn record_walk_recorded(summary: &WalkSummary) {
    metrics::counter!("walkgraph_walks_recorded_total").increment(1);
    metrics::counter!("walkgraph_edges_recorded_total").increment(summary.edges_recorded as u64);
}

/// Record a successful query.
///
/// `kind` is `one_to_one` or `one_to_all`.
pub fn record_query(kind: &str) {
    metrics::counter!("walkgraph_queries_total", "kind" => kind.to_string()).increment(1);
}

/// Record a failed request.
///
/// `reason` is an `ErrorKind` label (e.g. `validation_error`, `not_found`) or
/// `decode_error` for frames that are not valid requests.
pub fn record_request_failed(reason: &str) {
    metrics::counter!("walkgraph_requests_failed_total", "reason" => reason.to_string())
        .increment(1);
}

pub fn record_reset() {
    metrics::counter!("walkgraph_resets_total").increment(1);
}

/// Record how long an operation waited for its admission group.
pub fn record_admission_wait(group: Group, waited: Duration) {
    metrics::histogram!("walkgraph_admission_wait_seconds", "group" => group.as_str())
        .record(waited.as_secs_f64());
}

/// Publish graph size gauges.
pub fn record_graph_size(stats: &NetworkStats) {
    metrics::gauge!("walkgraph_nodes").set(stats.nodes as f64);
    metrics::gauge!("walkgraph_edges").set(stats.edges as f64);
}

pub fn record_connection_opened() {
    metrics::gauge!("walkgraph_open_connections").increment(1.0);
}

pub fn record_connection_closed() {
    metrics::gauge!("walkgraph_open_connections").decrement(1.0);
}

/// Feeds admission wait times into `walkgraph_admission_wait_seconds`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdmissionMetrics;

impl AdmissionObserver for AdmissionMetrics {
    fn admitted(&self, group: Group, waited: Duration) {
        record_admission_wait(group, waited);
    }
}
