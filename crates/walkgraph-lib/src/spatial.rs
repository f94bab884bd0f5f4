//! Grid-bucketed spatial index that folds noisy coordinates onto canonical nodes.
//!
//! Every location accepted into the graph becomes a canonical node stored in an
//! append-only table and bucketed under the grid cell computed from its own
//! coordinates. Resolving a candidate scans the block of cells that can hold a
//! node within the matching radius and picks the closest one.
//!
//! # Matching rule
//!
//! A candidate matches an existing node when their squared distance is strictly
//! less than `match_radius²`. A point exactly on the radius is a different place.
//!
//! # Scan reach
//!
//! The scan covers `ceil(match_radius / cell_size)` cells in every direction,
//! so a matching node is never missed because it sits beyond the immediate
//! neighbour cells. With the defaults (250 unit cells, 500 unit radius) this
//! is a 5×5 block. Configurations needing more than [`MAX_SEARCH_REACH`]
//! cells per side are rejected.
//!
//! # Example
//!
//! ```
//! use walkgraph_lib::{Location, LocationIndex, ResolverConfig};
//!
//! let mut index = LocationIndex::new(ResolverConfig::default());
//! let door = index.resolve(Location::new(0.0, 0.0)).node();
//!
//! // 30 units away is the same place.
//! assert_eq!(index.lookup(Location::new(18.0, 24.0)), Some(door));
//! // A kilometre away is not.
//! assert_eq!(index.lookup(Location::new(1000.0, 0.0)), None);
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::error::{Error, Result};
use crate::location::{CellCoord, Location};

/// Default grid cell edge length.
pub const DEFAULT_CELL_SIZE: f64 = 250.0;

/// Default radius within which two reports are the same place.
pub const DEFAULT_MATCH_RADIUS: f64 = 500.0;

/// Largest accepted `ceil(match_radius / cell_size)`. A lookup scans
/// `(2 * reach + 1)²` cells.
pub const MAX_SEARCH_REACH: i64 = 64;

/// Identifier of a canonical node. Dense, assigned in creation order, and only
/// meaningful until the next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolver geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    /// Edge length of a grid cell.
    pub cell_size: f64,
    /// Distance below which two locations are the same place.
    pub match_radius: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            match_radius: DEFAULT_MATCH_RADIUS,
        }
    }
}

impl ResolverConfig {
    /// Build a validated configuration.
    pub fn new(cell_size: f64, match_radius: f64) -> Result<Self> {
        let config = Self {
            cell_size,
            match_radius,
        };
        config.validate()?;
        Ok(config)
    }

    /// Both values must be finite and strictly positive, and the radius may
    /// span at most [`MAX_SEARCH_REACH`] cells.
    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(Error::invalid_config(format!(
                "cell size must be a positive number, got {}",
                self.cell_size
            )));
        }
        if !(self.match_radius.is_finite() && self.match_radius > 0.0) {
            return Err(Error::invalid_config(format!(
                "match radius must be a positive number, got {}",
                self.match_radius
            )));
        }
        let ratio = self.match_radius / self.cell_size;
        if ratio > MAX_SEARCH_REACH as f64 {
            return Err(Error::invalid_config(format!(
                "match radius {} spans {ratio} cells of size {}, at most {MAX_SEARCH_REACH} allowed",
                self.match_radius, self.cell_size
            )));
        }
        Ok(())
    }

    pub fn cell_of(&self, location: &Location) -> CellCoord {
        CellCoord::containing(location, self.cell_size)
    }

    /// Number of cells scanned on each side of the candidate's own cell.
    /// Never above [`MAX_SEARCH_REACH`], even for an unvalidated config.
    pub fn search_reach(&self) -> i64 {
        ((self.match_radius / self.cell_size).ceil() as i64).clamp(1, MAX_SEARCH_REACH)
    }

    pub fn threshold_squared(&self) -> f64 {
        self.match_radius * self.match_radius
    }
}

/// Outcome of [`LocationIndex::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// The candidate matched a node that already existed.
    Existing(NodeId),
    /// The candidate was promoted to a new canonical node.
    Created(NodeId),
}

impl Resolved {
    pub fn node(self) -> NodeId {
        match self {
            Resolved::Existing(node) | Resolved::Created(node) => node,
        }
    }

    pub fn is_created(self) -> bool {
        matches!(self, Resolved::Created(_))
    }
}

/// Canonical node table plus the grid that indexes it.
#[derive(Debug, Clone)]
pub struct LocationIndex {
    config: ResolverConfig,
    nodes: Vec<Location>,
    cells: HashMap<CellCoord, Vec<NodeId>>,
}

impl Default for LocationIndex {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl LocationIndex {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            cells: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Number of canonical nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Location a canonical node was created from.
    pub fn location(&self, node: NodeId) -> Option<Location> {
        self.nodes.get(node.index()).copied()
    }

    /// Iterate canonical nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Location)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, location)| (NodeId(index), *location))
    }

    /// Find the canonical node for `candidate` without creating one.
    pub fn lookup(&self, candidate: Location) -> Option<NodeId> {
        self.nearest(&candidate)
            .filter(|(_, distance)| *distance < self.config.threshold_squared())
            .map(|(node, _)| node)
    }

    /// Find the canonical node for `candidate`, promoting the candidate itself
    /// to a new node when nothing lies within the matching radius.
    pub fn resolve(&mut self, candidate: Location) -> Resolved {
        if let Some(node) = self.lookup(candidate) {
            return Resolved::Existing(node);
        }

        let node = NodeId(self.nodes.len());
        self.nodes.push(candidate);
        self.cells
            .entry(self.config.cell_of(&candidate))
            .or_default()
            .push(node);
        trace!(node = %node, location = %candidate, "created canonical node");
        Resolved::Created(node)
    }

    /// Drop every node and cell.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.cells.clear();
    }

    /// Closest node in the scanned block with its squared distance.
    ///
    /// Cells are scanned by column offset, then row offset, both ascending,
    /// and each cell in creation order. An equidistant node never displaces
    /// the one already found, so ties go to the westmost cell, then the
    /// southmost, then the oldest node.
    fn nearest(&self, candidate: &Location) -> Option<(NodeId, f64)> {
        let centre = self.config.cell_of(candidate);
        let reach = self.config.search_reach();
        let mut best: Option<(NodeId, f64)> = None;

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                let Some(occupants) = self.cells.get(&centre.offset(dx, dy)) else {
                    continue;
                };
                for &node in occupants {
                    let distance = self.nodes[node.index()].distance_squared(candidate);
                    if best.map_or(true, |(_, closest)| distance < closest) {
                        best = Some((node, distance));
                    }
                }
            }
        }

        best
    }
}
