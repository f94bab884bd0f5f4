//! Health check handlers for the admin listener.
//!
//! `/health/live` answers as long as the process runs; `/health/ready`
//! additionally reports graph size and fails while the coordinator is
//! holding an exclusive reset.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `ok` or `not_ready: <reason>`.
    pub status: String,

    pub service: String,

    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            nodes: None,
            edges: None,
            uptime_seconds: None,
            started_at: None,
        }
    }

    pub fn ready(service: &str, version: &str, state: &AppState) -> Self {
        let stats = state.stats();
        Self {
            nodes: Some(stats.nodes),
            edges: Some(stats.edges),
            uptime_seconds: Some(state.uptime_seconds()),
            started_at: Some(state.started_at()),
            ..Self::alive(service, version)
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            ..Self::alive(service, version)
        }
    }
}

/// Liveness probe handler.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"walkgraph-service-shared","version":"0.1.0"}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe handler.
///
/// ```text
/// GET /health/ready
/// {"status":"ok","service":"walkgraph-service-shared","version":"0.1.0","nodes":12,"edges":30,"uptime_seconds":4,"started_at":"2026-01-12T10:00:00Z"}
/// ```
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    if state.network().coordinator().snapshot().exclusive {
        let status = HealthStatus::not_ready(service, version, "reset in progress");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    }

    let status = HealthStatus::ready(service, version, &state);
    (StatusCode::OK, Json(status)).into_response()
}
