//! The walk network: graph store, path engine and coordinator behind the four
//! boundary operations.
//!
//! ```
//! use walkgraph_lib::{Location, Walk, WalkNetwork};
//!
//! let network = WalkNetwork::new();
//! let a = Location::new(0.0, 0.0);
//! let b = Location::new(2000.0, 0.0);
//! let c = Location::new(4000.0, 0.0);
//!
//! network.record_walk(&Walk::new(vec![a, b, c], vec![10, 20]))?;
//! network.record_walk(&Walk::new(vec![a, c], vec![50]))?;
//!
//! assert_eq!(network.shortest_path(a, c)?, 30);
//! assert_eq!(network.total_cost(a)?, 40);
//! # Ok::<(), walkgraph_lib::Error>(())
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::coordinator::{Admission, AdmissionPolicy, Coordinator, Group};
use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::location::Location;
use crate::path::{shortest_path, total_reachable_cost};
use crate::spatial::ResolverConfig;

/// An ordered sequence of visited locations with the length of each leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walk {
    pub locations: Vec<Location>,
    /// `lengths[i]` is the length from `locations[i]` to `locations[i + 1]`.
    pub lengths: Vec<u32>,
}

impl Walk {
    pub fn new(locations: Vec<Location>, lengths: Vec<u32>) -> Self {
        Self { locations, lengths }
    }

    /// Check the walk's shape without touching any graph.
    pub fn validate(&self) -> Result<()> {
        Self::check(&self.locations, &self.lengths)
    }

    /// [`Walk::validate`] over borrowed parts.
    pub fn check(locations: &[Location], lengths: &[u32]) -> Result<()> {
        if locations.len() < 2 {
            return Err(Error::invalid_walk(format!(
                "a walk needs at least 2 locations, got {}",
                locations.len()
            )));
        }
        if lengths.len() != locations.len() - 1 {
            return Err(Error::invalid_walk(format!(
                "{} locations need {} lengths, got {}",
                locations.len(),
                locations.len() - 1,
                lengths.len()
            )));
        }
        if let Some(position) = locations.iter().position(|l| !l.is_finite()) {
            return Err(Error::invalid_walk(format!(
                "location {position} has a non-finite coordinate"
            )));
        }
        if let Some(position) = lengths.iter().position(|&length| length == 0) {
            return Err(Error::invalid_walk(format!(
                "length {position} must be a positive integer"
            )));
        }
        Ok(())
    }

    /// Consecutive `(from, to, length)` legs.
    pub fn segments(&self) -> impl Iterator<Item = (Location, Location, u32)> + '_ {
        self.locations
            .windows(2)
            .zip(&self.lengths)
            .map(|(pair, &length)| (pair[0], pair[1], length))
    }
}

/// What a recorded walk changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkSummary {
    /// Observations recorded, one per leg.
    pub edges_recorded: usize,
    /// Directed edges seen for the first time.
    pub new_edges: usize,
    /// Canonical nodes created.
    pub nodes_created: usize,
}

/// Graph size counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub nodes: usize,
    pub edges: usize,
    pub observations: u64,
}

/// Settings for a [`WalkNetwork`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkConfig {
    pub resolver: ResolverConfig,
    pub policy: AdmissionPolicy,
    /// Give up waiting for admission after this long. `None` waits forever.
    pub admission_timeout: Option<Duration>,
}

/// Receives the time each operation waited before it was admitted.
pub trait AdmissionObserver: Send + Sync {
    fn admitted(&self, group: Group, waited: Duration);
}

/// Thread-safe walk network shared by every connection.
pub struct WalkNetwork {
    store: GraphStore,
    coordinator: Coordinator,
    admission_timeout: Option<Duration>,
    observer: Option<Arc<dyn AdmissionObserver>>,
}

impl fmt::Debug for WalkNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkNetwork")
            .field("store", &self.store)
            .field("coordinator", &self.coordinator)
            .field("admission_timeout", &self.admission_timeout)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Default for WalkNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl WalkNetwork {
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }

    pub fn with_config(config: NetworkConfig) -> Self {
        Self {
            store: GraphStore::new(config.resolver),
            coordinator: Coordinator::new(config.policy),
            admission_timeout: config.admission_timeout,
            observer: None,
        }
    }

    /// Attach an observer notified after every admission.
    pub fn with_observer(mut self, observer: Arc<dyn AdmissionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Record every leg of `walk` as one mutate operation.
    ///
    /// The walk is validated first; an invalid walk records nothing.
    pub fn record_walk(&self, walk: &Walk) -> Result<WalkSummary> {
        walk.validate()?;
        let _admission = self.admit(Group::Mutate)?;

        let mut summary = WalkSummary::default();
        for (source, destination, length) in walk.segments() {
            let insert = self.store.add_edge(source, destination, length);
            summary.edges_recorded += 1;
            summary.new_edges += usize::from(insert.new_edge);
            summary.nodes_created += insert.nodes_created();
        }

        debug!(
            legs = summary.edges_recorded,
            new_edges = summary.new_edges,
            nodes_created = summary.nodes_created,
            "recorded walk"
        );
        Ok(summary)
    }

    /// Cheapest directed distance from `origin` to `destination`.
    pub fn shortest_path(&self, origin: Location, destination: Location) -> Result<u64> {
        ensure_finite(origin, "origin")?;
        ensure_finite(destination, "destination")?;
        let _admission = self.admit(Group::Query)?;

        let view = self.store.read();
        let start = view
            .lookup(origin)
            .ok_or(Error::UnknownLocation { location: origin })?;
        let goal = view.lookup(destination).ok_or(Error::UnknownLocation {
            location: destination,
        })?;

        shortest_path(view.adjacency(), start, goal).ok_or(Error::PathNotFound {
            origin,
            destination,
        })
    }

    /// Sum of the shortest distances from `origin` to every reachable place.
    pub fn total_cost(&self, origin: Location) -> Result<u64> {
        ensure_finite(origin, "origin")?;
        let _admission = self.admit(Group::Query)?;

        let view = self.store.read();
        let start = view
            .lookup(origin)
            .ok_or(Error::UnknownLocation { location: origin })?;
        Ok(total_reachable_cost(view.adjacency(), start))
    }

    /// Drop every node and edge once all in-flight operations have finished.
    pub fn reset(&self) -> Result<()> {
        let _admission = self.admit(Group::Exclusive)?;
        let before = self.stats();
        self.store.clear();
        info!(
            nodes = before.nodes,
            edges = before.edges,
            "walk network reset"
        );
        Ok(())
    }

    /// Current graph size. Not coordinated with in-flight operations.
    pub fn stats(&self) -> NetworkStats {
        let view = self.store.read();
        NetworkStats {
            nodes: view.index().len(),
            edges: view.adjacency().edge_count(),
            observations: view.adjacency().observation_count(),
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    fn admit(&self, group: Group) -> Result<Admission<'_>> {
        let admission = match self.admission_timeout {
            Some(timeout) => self.coordinator.admit_within(group, timeout)?,
            None => self.coordinator.admit(group),
        };
        if let Some(observer) = &self.observer {
            observer.admitted(group, admission.waited());
        }
        Ok(admission)
    }
}

fn ensure_finite(location: Location, field: &'static str) -> Result<()> {
    if location.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidLocation { field })
    }
}
