//! Wire request types and their validation.

use serde::{Deserialize, Serialize};
use walkgraph_lib::{Location, Walk};

use crate::ProblemDetails;

/// Validation trait for request types.
///
/// Implementations check every field and return a `ProblemDetails` for
/// invalid input; `request_id` fills its `instance` field.
///
/// Returns a boxed `ProblemDetails` to avoid large `Result::Err` variants.
pub trait Validate {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

/// One protocol request.
///
/// ```
/// use walkgraph_service_shared::Request;
///
/// let request: Request = serde_json::from_str(r#""reset""#).unwrap();
/// assert_eq!(request, Request::Reset);
/// assert_eq!(request.kind(), "reset");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    /// Record a walk.
    Walk(WalkRequest),
    /// Shortest distance between two places.
    OneToOne(OneToOneRequest),
    /// Total shortest distance from one place to everything it reaches.
    OneToAll(OneToAllRequest),
    /// Forget every place and edge.
    Reset,
    /// Graph size counters.
    Stats,
}

impl Request {
    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Walk(_) => "walk",
            Request::OneToOne(_) => "one_to_one",
            Request::OneToAll(_) => "one_to_all",
            Request::Reset => "reset",
            Request::Stats => "stats",
        }
    }
}

impl Validate for Request {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        match self {
            Request::Walk(walk) => walk.validate(request_id),
            Request::OneToOne(query) => query.validate(request_id),
            Request::OneToAll(query) => query.validate(request_id),
            Request::Reset | Request::Stats => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkRequest {
    pub locations: Vec<Location>,
    pub lengths: Vec<u32>,
}

impl From<WalkRequest> for Walk {
    fn from(request: WalkRequest) -> Self {
        Walk::new(request.locations, request.lengths)
    }
}

impl From<Walk> for WalkRequest {
    fn from(walk: Walk) -> Self {
        Self {
            locations: walk.locations,
            lengths: walk.lengths,
        }
    }
}

impl Validate for WalkRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        Walk::check(&self.locations, &self.lengths)
            .map_err(|e| Box::new(ProblemDetails::bad_request(e.to_string(), request_id)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneToOneRequest {
    pub origin: Location,
    pub destination: Location,
}

impl Validate for OneToOneRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_finite(&self.origin, "origin", request_id)?;
        require_finite(&self.destination, "destination", request_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneToAllRequest {
    pub origin: Location,
}

impl Validate for OneToAllRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_finite(&self.origin, "origin", request_id)
    }
}

fn require_finite(
    location: &Location,
    field: &str,
    request_id: &str,
) -> Result<(), Box<ProblemDetails>> {
    if location.is_finite() {
        return Ok(());
    }
    Err(Box::new(ProblemDetails::bad_request(
        format!("The '{field}' coordinates must be finite numbers"),
        request_id,
    )))
}
