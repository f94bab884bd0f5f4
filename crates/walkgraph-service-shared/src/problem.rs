//! RFC 9457 style problem details.
//!
//! The TCP protocol embeds a [`ProblemDetails`] in every error response and
//! the admin HTTP listener returns one as `application/problem+json`.
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use walkgraph_lib::{Error as LibError, ErrorKind};

/// Problem type URI for malformed or invalid requests.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for coordinates that match no known place.
pub const PROBLEM_UNKNOWN_LOCATION: &str = "/problems/unknown-location";

/// Problem type URI for known places with no directed path between them.
pub const PROBLEM_PATH_NOT_FOUND: &str = "/problems/path-not-found";

/// Problem type URI for operations that could not be admitted in time.
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "/problems/service-unavailable";

pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// Structured failure description.
///
/// # Example
///
/// ```
/// use walkgraph_service_shared::{ProblemDetails, PROBLEM_UNKNOWN_LOCATION};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(
///     PROBLEM_UNKNOWN_LOCATION,
///     "Unknown Location",
///     StatusCode::NOT_FOUND,
/// )
/// .with_detail("location (10, 20) does not match any known place")
/// .with_request_id("0190a0c4-3c7e-7d6a-8d1e-6f2b9f7f4a11");
/// assert!(!problem.retryable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem type.
    pub title: String,

    /// Equivalent HTTP status code.
    pub status: u16,

    /// Explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Whether resending the same request later may succeed.
    #[serde(default)]
    pub retryable: bool,

    /// Request identifier of this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            retryable: status == StatusCode::SERVICE_UNAVAILABLE,
            instance: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// 400: the request could not be decoded or failed validation.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 404: a coordinate matched no canonical place.
    pub fn unknown_location(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UNKNOWN_LOCATION,
            "Unknown Location",
            StatusCode::NOT_FOUND,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 404: both places are known but unreachable from one another.
    pub fn path_not_found(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_PATH_NOT_FOUND,
            "Path Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 503: retry later.
    pub fn service_unavailable(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_SERVICE_UNAVAILABLE,
            "Service Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title,
            self.detail.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        *response.status_mut() = status;
        response
    }
}

/// Convert a library error into its problem description.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::UnknownLocation { .. } => {
            ProblemDetails::unknown_location(error.to_string(), request_id)
        }
        LibError::PathNotFound { .. } => ProblemDetails::path_not_found(error.to_string(), request_id),
        _ => match error.kind() {
            ErrorKind::Validation => ProblemDetails::bad_request(error.to_string(), request_id),
            ErrorKind::Unavailable => {
                ProblemDetails::service_unavailable(error.to_string(), request_id)
            }
            ErrorKind::NotFound | ErrorKind::Internal => {
                ProblemDetails::internal_error(error.to_string(), request_id)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use walkgraph_lib::{Group, Location};

    #[test]
    fn test_problem_details_new() {
        let problem = ProblemDetails::new(
            PROBLEM_PATH_NOT_FOUND,
            "Path Not Found",
            StatusCode::NOT_FOUND,
        );
        assert_eq!(problem.type_uri, PROBLEM_PATH_NOT_FOUND);
        assert_eq!(problem.status, 404);
        assert!(!problem.retryable);
        assert!(problem.detail.is_none());
    }

    #[test]
    fn test_problem_details_bad_request() {
        let problem = ProblemDetails::bad_request("expected value at line 1", "req-123");
        assert_eq!(problem.status, 400);
        assert_eq!(problem.instance.as_deref(), Some("req-123"));
        assert_eq!(problem.to_string(), "Invalid Request: expected value at line 1");
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = ProblemDetails::service_unavailable("busy", "req-test");
        let json = serde_json::to_string(&problem).unwrap();

        assert!(json.contains("\"type\":\"/problems/service-unavailable\""));
        assert!(json.contains("\"status\":503"));
        assert!(json.contains("\"retryable\":true"));
        assert!(json.contains("\"instance\":\"req-test\""));
    }

    #[test]
    fn test_from_lib_error_maps_every_kind() {
        let unknown = LibError::UnknownLocation {
            location: Location::new(1.0, 2.0),
        };
        let problem = from_lib_error(&unknown, "r");
        assert_eq!(problem.type_uri, PROBLEM_UNKNOWN_LOCATION);
        assert!(problem.detail.as_deref().unwrap().contains("(1, 2)"));

        let no_path = LibError::PathNotFound {
            origin: Location::new(0.0, 0.0),
            destination: Location::new(5.0, 5.0),
        };
        assert_eq!(from_lib_error(&no_path, "r").type_uri, PROBLEM_PATH_NOT_FOUND);

        let invalid = LibError::InvalidLocation { field: "origin" };
        assert_eq!(from_lib_error(&invalid, "r").status, 400);

        let busy = LibError::AdmissionTimedOut {
            group: Group::Mutate,
            waited: Duration::from_millis(5),
        };
        let problem = from_lib_error(&busy, "r");
        assert_eq!(problem.type_uri, PROBLEM_SERVICE_UNAVAILABLE);
        assert!(problem.retryable);

        let config = LibError::InvalidConfig {
            message: "cell size".to_string(),
        };
        assert_eq!(from_lib_error(&config, "r").status, 500);
    }

    #[test]
    fn test_problem_details_into_response_sets_status() {
        let response = ProblemDetails::path_not_found("none", "r").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(axum::http::header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }
}
