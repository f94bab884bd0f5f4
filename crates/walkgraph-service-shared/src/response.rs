//! Response types: the TCP protocol reply and the admin HTTP wrapper.

use axum::{
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use walkgraph_lib::{NetworkStats, WalkSummary};

use crate::ProblemDetails;

/// Outcome flag of a protocol reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// One protocol reply. Only the field that belongs to the request is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortest_path_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk: Option<WalkSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<NetworkStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<ProblemDetails>,
}

impl Response {
    /// Success without a payload (reset).
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            shortest_path_length: None,
            total_length: None,
            walk: None,
            stats: None,
            problem: None,
        }
    }

    pub fn walk_recorded(summary: WalkSummary) -> Self {
        Self {
            walk: Some(summary),
            ..Self::ok()
        }
    }

    pub fn shortest_path(length: u64) -> Self {
        Self {
            shortest_path_length: Some(length),
            ..Self::ok()
        }
    }

    pub fn total(length: u64) -> Self {
        Self {
            total_length: Some(length),
            ..Self::ok()
        }
    }

    pub fn stats(stats: NetworkStats) -> Self {
        Self {
            stats: Some(stats),
            ..Self::ok()
        }
    }

    pub fn error(problem: ProblemDetails) -> Self {
        Self {
            status: Status::Error,
            problem: Some(problem),
            ..Self::ok()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

impl From<ProblemDetails> for Response {
    fn from(problem: ProblemDetails) -> Self {
        Self::error(problem)
    }
}

/// Wrapper for successful admin HTTP responses with content type metadata,
/// mirroring the `ProblemDetails` shape.
///
/// ```
/// use walkgraph_service_shared::ServiceResponse;
/// use walkgraph_lib::NetworkStats;
///
/// let response = ServiceResponse::new(NetworkStats::default());
/// assert_eq!(response.content_type, "application/json");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse<T> {
    #[serde(flatten)]
    pub data: T,

    pub content_type: String,
}

impl<T> ServiceResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            content_type: "application/json".to_string(),
        }
    }
}

impl<T> From<T> for ServiceResponse<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

impl<T: Serialize> IntoResponse for ServiceResponse<T> {
    fn into_response(self) -> HttpResponse {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_reply_omits_unset_fields() {
        let json = serde_json::to_string(&Response::shortest_path(30)).unwrap();
        assert_eq!(json, r#"{"status":"ok","shortest_path_length":30}"#);

        let json = serde_json::to_string(&Response::ok()).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);
    }

    #[test]
    fn test_error_reply_carries_the_problem() {
        let reply = Response::error(ProblemDetails::path_not_found("no path", "req-1"));
        let json = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["problem"]["type"], "/problems/path-not-found");
        assert_eq!(json["problem"]["instance"], "req-1");
        assert!(json.get("total_length").is_none());
        assert!(!reply.is_ok());
    }

    #[test]
    fn test_reply_round_trips_for_clients() {
        let reply = Response::stats(NetworkStats {
            nodes: 3,
            edges: 2,
            observations: 7,
        });
        let text = serde_json::to_string(&reply).unwrap();
        let back: Response = serde_json::from_str(&text).unwrap();
        assert_eq!(back, reply);
    }

    #[test]
    fn test_service_response_flattens_data() {
        let response = ServiceResponse::new(NetworkStats {
            nodes: 1,
            edges: 0,
            observations: 0,
        });
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("\"nodes\":1"));
        assert!(json.contains("\"content_type\":\"application/json\""));
        assert!(!json.contains("\"data\":{"));
    }
}
