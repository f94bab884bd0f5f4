//! Shared infrastructure for the walk graph service and its clients.
//!
//! - [`AppState`]: the shared walk network
//! - [`codec`]: length-prefixed JSON framing for the TCP protocol
//! - [`Request`] / [`Response`]: protocol messages, with [`Validate`]
//! - [`dispatch`]: turns decoded requests into network operations
//! - [`ProblemDetails`]: RFC 9457 style failure descriptions
//! - [`config`]: service configuration from the environment
//! - [`health`], [`metrics`], [`middleware`]: admin HTTP listener glue
//! - [`logging`]: structured logging setup
//!
//! # Architecture
//!
//! All graph logic lives in `walkgraph-lib`; this crate only adapts it to the
//! wire:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Connection task                                            │
//! │  - Read a frame (codec)                                     │
//! │  - Decode and validate the request                          │
//! │  - Call walkgraph-lib on the blocking pool (dispatch)       │
//! │  - Write the reply frame                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides state fixtures and request builders.
//! Enable the `test-utils` feature to access it from dependent crates.

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use codec::{read_frame, write_frame, write_json, FrameError, DEFAULT_MAX_FRAME_BYTES};
pub use config::{ConfigError, ServiceConfig};
pub use dispatch::{handle_payload, handle_request};
pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_connection_closed, record_connection_opened,
    AdmissionMetrics, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST,
    PROBLEM_PATH_NOT_FOUND, PROBLEM_SERVICE_UNAVAILABLE, PROBLEM_UNKNOWN_LOCATION,
};
pub use request::{OneToAllRequest, OneToOneRequest, Request, Validate, WalkRequest};
pub use response::{Response, ServiceResponse, Status};
pub use state::AppState;
