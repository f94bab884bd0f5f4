//! Test helpers for the service and CLI crates.
//!
//! Enable the `test-utils` feature to use them from dependent crates.

use walkgraph_lib::{Location, NetworkConfig, ResolverConfig};

use crate::middleware::RequestId;
use crate::request::{OneToAllRequest, OneToOneRequest, Request, WalkRequest};
use crate::state::AppState;

/// Fresh state with default resolver settings.
pub fn test_state() -> AppState {
    AppState::default()
}

/// Fresh state whose resolver keeps points one unit apart distinct.
pub fn fine_grained_state() -> AppState {
    let resolver = ResolverConfig {
        cell_size: 1.0,
        match_radius: 1.0,
    };
    AppState::new(NetworkConfig {
        resolver,
        ..NetworkConfig::default()
    })
}

/// Places far enough apart that the default resolver never merges them.
pub fn far_place(i: u32) -> Location {
    Location::new(f64::from(i) * 2000.0, 0.0)
}

pub fn walk(points: &[(f64, f64)], lengths: &[u32]) -> Request {
    Request::Walk(WalkRequest {
        locations: points.iter().map(|&p| Location::from(p)).collect(),
        lengths: lengths.to_vec(),
    })
}

pub fn one_to_one(origin: (f64, f64), destination: (f64, f64)) -> Request {
    Request::OneToOne(OneToOneRequest {
        origin: origin.into(),
        destination: destination.into(),
    })
}

pub fn one_to_all(origin: (f64, f64)) -> Request {
    Request::OneToAll(OneToAllRequest {
        origin: origin.into(),
    })
}

pub fn test_request_id() -> String {
    RequestId::generate().to_string()
}
