//! Reachability
//!
//! Breadth-first traversals used to decide which nodes relate to a hovered
//! or selected node. These run on every hover, so each traversal is
//! `O(V + E)` with a constant-time dequeue.

use std::collections::VecDeque;

use indexmap::IndexSet;

use crate::graph::{AdjacencyIndex, NodeId};

/// Traversal direction over the adjacency index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards dependencies.
    Upstream,
    /// Towards consumers.
    Downstream,
}

impl Direction {
    fn neighbours<'a>(&self, index: &'a AdjacencyIndex, id: &str) -> &'a [NodeId] {
        match self {
            Direction::Upstream => index.upstream(id),
            Direction::Downstream => index.downstream(id),
        }
    }
}

/// Immediate and transitive upstream dependencies of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamClosure {
    /// Immediate upstream ids, in edge order.
    pub direct: Vec<NodeId>,
    /// Everything further upstream, excluding `direct` and the node itself.
    pub transitive: Vec<NodeId>,
}

/// Visit everything reachable from `start` in `direction`, adding each id
/// (including `start`) to `visited`.
fn traverse(
    index: &AdjacencyIndex,
    start: &NodeId,
    direction: Direction,
    visited: &mut IndexSet<NodeId>,
) {
    let mut seen: IndexSet<&str> = IndexSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    seen.insert(start.as_str());
    queue.push_back(start.as_str());
    visited.insert(start.clone());

    while let Some(current) = queue.pop_front() {
        for next in direction.neighbours(index, current) {
            if seen.insert(next.as_str()) {
                visited.insert(next.clone());
                queue.push_back(next.as_str());
            }
        }
    }
}

/// Every node connected to `root` by a directed path in either direction,
/// plus `root` itself.
pub fn related(index: &AdjacencyIndex, root: &NodeId) -> IndexSet<NodeId> {
    let mut related = IndexSet::new();
    traverse(index, root, Direction::Downstream, &mut related);
    traverse(index, root, Direction::Upstream, &mut related);
    related
}

/// Split the upstream closure of `id` into immediate and transitive parts.
pub fn upstream_closure(index: &AdjacencyIndex, id: &NodeId) -> UpstreamClosure {
    let direct: Vec<NodeId> = index.upstream(id.as_str()).to_vec();

    let mut seen: IndexSet<&str> = direct.iter().map(NodeId::as_str).collect();
    seen.insert(id.as_str());
    let mut queue: VecDeque<&str> = direct.iter().map(NodeId::as_str).collect();
    let mut transitive = Vec::new();

    while let Some(current) = queue.pop_front() {
        for next in index.upstream(current) {
            if seen.insert(next.as_str()) {
                transitive.push(next.clone());
                queue.push_back(next.as_str());
            }
        }
    }

    UpstreamClosure { direct, transitive }
}
