//! Turns decoded frames into walk network operations and replies.
//!
//! Everything here may block on admission, so callers on an async runtime
//! must run it on the blocking pool.

use tracing::{debug, info, warn};
use walkgraph_lib::{Error as LibError, Walk, WalkNetwork};

use crate::metrics::{
    record_graph_size, record_query, record_request_failed, record_reset, record_walk_recorded,
};
use crate::problem::{from_lib_error, ProblemDetails};
use crate::request::{Request, Validate};
use crate::response::Response;

/// Decode, validate and execute one frame payload.
pub fn handle_payload(network: &WalkNetwork, payload: &[u8], request_id: &str) -> Response {
    match serde_json::from_slice::<Request>(payload) {
        Ok(request) => handle_request(network, request, request_id),
        Err(e) => {
            warn!(request_id, error = %e, "undecodable request");
            record_request_failed("decode_error");
            Response::error(ProblemDetails::bad_request(
                format!("request is not valid JSON for this protocol: {e}"),
                request_id,
            ))
        }
    }
}

/// Validate and execute one request.
pub fn handle_request(network: &WalkNetwork, request: Request, request_id: &str) -> Response {
    let kind = request.kind();
    debug!(request_id, kind, "handling request");

    if let Err(problem) = request.validate(request_id) {
        record_request_failed("validation_error");
        info!(request_id, kind, detail = ?problem.detail, "request rejected");
        return Response::error(*problem);
    }

    let outcome = match request {
        Request::Walk(walk) => network.record_walk(&Walk::from(walk)).map(|summary| {
            record_walk_recorded(&summary);
            record_graph_size(&network.stats());
            Response::walk_recorded(summary)
        }),
        Request::OneToOne(query) => network
            .shortest_path(query.origin, query.destination)
            .map(|length| {
                record_query(kind);
                Response::shortest_path(length)
            }),
        Request::OneToAll(query) => network.total_cost(query.origin).map(|total| {
            record_query(kind);
            Response::total(total)
        }),
        Request::Reset => network.reset().map(|()| {
            record_reset();
            record_graph_size(&network.stats());
            Response::ok()
        }),
        Request::Stats => Ok(Response::stats(network.stats())),
    };

    outcome.unwrap_or_else(|error| failure(&error, kind, request_id))
}

fn failure(error: &LibError, kind: &str, request_id: &str) -> Response {
    let reason = error.kind().as_str();
    record_request_failed(reason);
    if error.kind().is_retryable() {
        warn!(request_id, kind, error = %error, "operation not admitted");
    } else {
        info!(request_id, kind, reason, error = %error, "operation failed");
    }
    Response::error(from_lib_error(error, request_id))
}
