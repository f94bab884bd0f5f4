use std::collections::HashMap;

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::debug;

use crate::location::Location;
use crate::spatial::{LocationIndex, NodeId, Resolved, ResolverConfig};

/// Accumulated observations for one directed pair of nodes.
///
/// Only the count and the sum are kept; the effective cost is the floor of
/// their mean, which is all pathfinding ever needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeRecord {
    observations: u64,
    total_weight: u64,
}

impl EdgeRecord {
    /// Fold one observed weight into the record.
    pub fn record(&mut self, weight: u32) {
        self.observations += 1;
        self.total_weight = self.total_weight.saturating_add(u64::from(weight));
    }

    /// How many times this directed pair has been reported.
    pub fn observations(&self) -> u64 {
        self.observations
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Floor of the mean observed weight, or 0 before any observation.
    pub fn effective_cost(&self) -> u64 {
        if self.observations == 0 {
            0
        } else {
            self.total_weight / self.observations
        }
    }
}

/// Directed adjacency relation: node to (neighbour to edge record).
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    outgoing: HashMap<NodeId, HashMap<NodeId, EdgeRecord>>,
    edge_count: usize,
    observation_count: u64,
}

impl Adjacency {
    /// Record one observation of `source -> destination`. Returns `true` when
    /// the edge did not exist before.
    pub fn record(&mut self, source: NodeId, destination: NodeId, weight: u32) -> bool {
        let neighbours = self.outgoing.entry(source).or_default();
        let created = !neighbours.contains_key(&destination);
        neighbours.entry(destination).or_default().record(weight);

        if created {
            self.edge_count += 1;
        }
        self.observation_count += 1;
        created
    }

    /// Outgoing neighbours of `node` with their effective cost, computed now.
    pub fn neighbours(&self, node: NodeId) -> impl Iterator<Item = (NodeId, u64)> + '_ {
        self.outgoing
            .get(&node)
            .into_iter()
            .flat_map(|neighbours| neighbours.iter())
            .map(|(&target, record)| (target, record.effective_cost()))
    }

    pub fn edge(&self, source: NodeId, destination: NodeId) -> Option<&EdgeRecord> {
        self.outgoing.get(&source)?.get(&destination)
    }

    /// Number of distinct directed edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Total number of weights ever recorded.
    pub fn observation_count(&self) -> u64 {
        self.observation_count
    }

    pub fn clear(&mut self) {
        self.outgoing.clear();
        self.edge_count = 0;
        self.observation_count = 0;
    }
}

/// Result of [`GraphStore::add_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeInsert {
    pub source: Resolved,
    pub destination: Resolved,
    /// The directed edge was seen for the first time.
    pub new_edge: bool,
}

impl EdgeInsert {
    /// Number of canonical nodes this insert created (0 to 2).
    pub fn nodes_created(&self) -> usize {
        usize::from(self.source.is_created()) + usize::from(self.destination.is_created())
    }
}

/// The shared graph: canonical node index plus adjacency relation.
///
/// Both halves sit behind their own lock so that mutators admitted together
/// can insert safely. Group-level exclusion between mutators and readers is
/// the caller's job (see [`crate::coordinator`]); the locks here only make
/// concurrent access within one group memory-safe.
#[derive(Debug, Default)]
pub struct GraphStore {
    index: RwLock<LocationIndex>,
    adjacency: RwLock<Adjacency>,
}

impl GraphStore {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            index: RwLock::new(LocationIndex::new(config)),
            adjacency: RwLock::new(Adjacency::default()),
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        *self.index.read().config()
    }

    /// Resolve both endpoints (creating nodes as needed) and record `weight`
    /// for the directed edge between them.
    pub fn add_edge(&self, source: Location, destination: Location, weight: u32) -> EdgeInsert {
        let (source, destination) = {
            let mut index = self.index.write();
            let source = index.resolve(source);
            let destination = index.resolve(destination);
            (source, destination)
        };

        let new_edge = self
            .adjacency
            .write()
            .record(source.node(), destination.node(), weight);

        EdgeInsert {
            source,
            destination,
            new_edge,
        }
    }

    /// Non-creating resolution.
    pub fn lookup(&self, location: Location) -> Option<NodeId> {
        self.index.read().lookup(location)
    }

    /// Read-only view holding both halves for the duration of a traversal.
    pub fn read(&self) -> GraphView<'_> {
        let index = self.index.read();
        let adjacency = self.adjacency.read();
        GraphView { index, adjacency }
    }

    pub fn node_count(&self) -> usize {
        self.index.read().len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.read().edge_count()
    }

    pub fn observation_count(&self) -> u64 {
        self.adjacency.read().observation_count()
    }

    /// Drop every node and edge.
    pub fn clear(&self) {
        let mut index = self.index.write();
        let mut adjacency = self.adjacency.write();
        debug!(
            nodes = index.len(),
            edges = adjacency.edge_count(),
            "clearing graph store"
        );
        index.clear();
        adjacency.clear();
    }
}

/// Consistent read access to a [`GraphStore`].
pub struct GraphView<'a> {
    index: RwLockReadGuard<'a, LocationIndex>,
    adjacency: RwLockReadGuard<'a, Adjacency>,
}

impl GraphView<'_> {
    pub fn lookup(&self, location: Location) -> Option<NodeId> {
        self.index.lookup(location)
    }

    pub fn location(&self, node: NodeId) -> Option<Location> {
        self.index.location(node)
    }

    pub fn neighbours(&self, node: NodeId) -> impl Iterator<Item = (NodeId, u64)> + '_ {
        self.adjacency.neighbours(node)
    }

    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    pub fn index(&self) -> &LocationIndex {
        &self.index
    }
}
