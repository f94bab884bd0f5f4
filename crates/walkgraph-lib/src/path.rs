use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::graph::Adjacency;
use crate::spatial::NodeId;

/// Length of the cheapest directed path from `start` to `goal`, using each
/// edge's effective cost at the time it is relaxed.
///
/// Returns `Some(0)` when `start == goal` and `None` when `goal` cannot be
/// reached.
pub fn shortest_path(graph: &Adjacency, start: NodeId, goal: NodeId) -> Option<u64> {
    if start == goal {
        return Some(0);
    }

    let mut distances: HashMap<NodeId, u64> = HashMap::new();
    let mut queue = BinaryHeap::new();

    distances.insert(start, 0);
    queue.push(QueueEntry::new(start, 0));

    while let Some(entry) = queue.pop() {
        match distances.get(&entry.node) {
            Some(distance) if *distance < entry.cost => continue,
            Some(_) => {}
            None => continue,
        }

        if entry.node == goal {
            return Some(entry.cost);
        }

        for (next, cost) in graph.neighbours(entry.node) {
            let next_cost = entry.cost.saturating_add(cost);
            if next_cost < *distances.get(&next).unwrap_or(&u64::MAX) {
                distances.insert(next, next_cost);
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    None
}

/// Sum of the shortest distances from `start` to every node it can reach.
///
/// Each node contributes once, when it is finalized. The start contributes
/// 0, so a start without outgoing edges yields 0.
pub fn total_reachable_cost(graph: &Adjacency, start: NodeId) -> u64 {
    let mut distances: HashMap<NodeId, u64> = HashMap::new();
    let mut finalized: HashSet<NodeId> = HashSet::new();
    let mut queue = BinaryHeap::new();
    let mut total: u64 = 0;

    distances.insert(start, 0);
    queue.push(QueueEntry::new(start, 0));

    while let Some(entry) = queue.pop() {
        if !finalized.insert(entry.node) {
            continue;
        }
        total = total.saturating_add(entry.cost);

        for (next, cost) in graph.neighbours(entry.node) {
            if finalized.contains(&next) {
                continue;
            }
            let next_cost = entry.cost.saturating_add(cost);
            if next_cost < *distances.get(&next).unwrap_or(&u64::MAX) {
                distances.insert(next, next_cost);
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    total
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeId,
    cost: u64,
}

impl QueueEntry {
    fn new(node: NodeId, cost: u64) -> Self {
        Self { node, cost }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Adjacency {
        let mut graph = Adjacency::default();
        graph.record(NodeId(0), NodeId(1), 10);
        graph.record(NodeId(1), NodeId(2), 20);
        graph.record(NodeId(0), NodeId(2), 50);
        graph
    }

    #[test]
    fn queue_pops_cheapest_first() {
        let mut queue = BinaryHeap::new();
        queue.push(QueueEntry::new(NodeId(1), 30));
        queue.push(QueueEntry::new(NodeId(2), 5));
        queue.push(QueueEntry::new(NodeId(3), 12));

        let order: Vec<u64> = std::iter::from_fn(|| queue.pop().map(|e| e.cost)).collect();
        assert_eq!(order, vec![5, 12, 30]);
    }

    #[test]
    fn detour_beats_direct_edge() {
        assert_eq!(shortest_path(&triangle(), NodeId(0), NodeId(2)), Some(30));
    }

    #[test]
    fn direction_matters() {
        assert_eq!(shortest_path(&triangle(), NodeId(2), NodeId(0)), None);
    }

    #[test]
    fn start_is_its_own_destination() {
        assert_eq!(
            shortest_path(&Adjacency::default(), NodeId(4), NodeId(4)),
            Some(0)
        );
    }

    #[test]
    fn total_counts_each_node_once_at_its_shortest_distance() {
        // 0 + 10 + 30
        assert_eq!(total_reachable_cost(&triangle(), NodeId(0)), 40);
        assert_eq!(total_reachable_cost(&triangle(), NodeId(1)), 20);
    }

    #[test]
    fn total_from_a_sink_is_zero() {
        assert_eq!(total_reachable_cost(&triangle(), NodeId(2)), 0);
    }

    #[test]
    fn cycles_terminate() {
        let mut graph = Adjacency::default();
        graph.record(NodeId(0), NodeId(1), 3);
        graph.record(NodeId(1), NodeId(0), 3);
        graph.record(NodeId(1), NodeId(2), 4);

        assert_eq!(shortest_path(&graph, NodeId(0), NodeId(2)), Some(7));
        assert_eq!(total_reachable_cost(&graph, NodeId(0)), 10);
    }
}
