//! Shared application state.
//!
//! One [`WalkNetwork`] serves every TCP connection and the admin listener.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use walkgraph_lib::{NetworkConfig, NetworkStats, WalkNetwork};

use crate::metrics::AdmissionMetrics;

/// Cheaply cloneable handle to the walk network.
///
/// # Example
///
/// ```
/// use axum::{extract::State, routing::get, Json, Router};
/// use walkgraph_service_shared::AppState;
///
/// async fn stats(State(state): State<AppState>) -> Json<walkgraph_lib::NetworkStats> {
///     Json(state.network().stats())
/// }
///
/// let app: Router = Router::new()
///     .route("/stats", get(stats))
///     .with_state(AppState::default());
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    network: WalkNetwork,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

impl AppState {
    /// Create an empty network that reports admission waits to Prometheus.
    pub fn new(config: NetworkConfig) -> Self {
        let network = WalkNetwork::with_config(config).with_observer(Arc::new(AdmissionMetrics));
        Self::from_network(network)
    }

    /// Wrap an already constructed network.
    pub fn from_network(network: WalkNetwork) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                network,
                started: Instant::now(),
                started_at: Utc::now(),
            }),
        }
    }

    pub fn network(&self) -> &WalkNetwork {
        &self.inner.network
    }

    pub fn stats(&self) -> NetworkStats {
        self.inner.network.stats()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.inner.started.elapsed().as_secs()
    }

    /// Start time as an RFC 3339 timestamp.
    pub fn started_at(&self) -> String {
        self.inner
            .started_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("AppState")
            .field("nodes", &stats.nodes)
            .field("edges", &stats.edges)
            .field("policy", &self.inner.network.coordinator().policy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkgraph_lib::{Location, Walk};

    #[test]
    fn test_app_state_clones_share_the_network() {
        let state = AppState::default();
        let clone = state.clone();

        state
            .network()
            .record_walk(&Walk::new(
                vec![Location::new(0.0, 0.0), Location::new(5000.0, 0.0)],
                vec![4],
            ))
            .unwrap();

        assert_eq!(clone.stats().nodes, 2);
        assert_eq!(clone.stats().edges, 1);
    }

    #[test]
    fn test_app_state_debug() {
        let debug = format!("{:?}", AppState::default());
        assert!(debug.contains("AppState"));
        assert!(debug.contains("nodes"));
        assert!(debug.contains("Greedy"));
    }
}
