//! Walk graph library entry points.
//!
//! This crate folds reported walks into a shared directed graph of places and
//! answers distance queries against it. Noisy coordinates are matched onto
//! canonical nodes by a grid-bucketed spatial index, repeated observations of
//! the same leg are averaged, and mutators and readers are admitted in
//! mutually exclusive groups. Higher-level consumers (the service and the CLI)
//! should only depend on the items exported here.
//!

pub mod coordinator;
pub mod error;
pub mod graph;
pub mod location;
pub mod network;
pub mod path;
pub mod spatial;

pub use coordinator::{Admission, AdmissionPolicy, Coordinator, CoordinatorSnapshot, Group};
pub use error::{Error, ErrorKind, Result};
pub use graph::{Adjacency, EdgeInsert, EdgeRecord, GraphStore, GraphView};
pub use location::{CellCoord, Location};
pub use network::{
    AdmissionObserver, NetworkConfig, NetworkStats, Walk, WalkNetwork, WalkSummary,
};
pub use path::{shortest_path, total_reachable_cost};
pub use spatial::{
    LocationIndex, NodeId, Resolved, ResolverConfig, DEFAULT_CELL_SIZE, DEFAULT_MATCH_RADIUS,
    MAX_SEARCH_REACH,
};
