//! Adjacency Index
//!
//! The adjacency index is a derived view over the edge list. It is never
//! patched in place: every change to the edge set rebuilds it from scratch in
//! `O(E)`, so it cannot drift out of sync with the edges it was built from.

use std::collections::{HashMap, HashSet, VecDeque};

use smallvec::SmallVec;

use super::edge::Edge;
use super::node::NodeId;

/// Neighbour list. Most components have only a handful of edges.
type Neighbours = SmallVec<[NodeId; 4]>;

/// Upstream and downstream mappings derived from an edge list.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    /// Target id -> source ids of edges targeting it.
    upstream: HashMap<NodeId, Neighbours>,

    /// Source id -> target ids of edges sourced at it.
    downstream: HashMap<NodeId, Neighbours>,
}

impl AdjacencyIndex {
    /// Build the index from an edge list, preserving edge order.
    pub fn build(edges: &[Edge]) -> Self {
        let mut index = Self::default();
        for Edge { source, target } in edges {
            index
                .downstream
                .entry(source.clone())
                .or_default()
                .push(target.clone());
            index
                .upstream
                .entry(target.clone())
                .or_default()
                .push(source.clone());
        }
        index
    }

    /// Ids that `id` depends on.
    pub fn upstream(&self, id: &str) -> &[NodeId] {
        self.upstream.get(id).map(|n| n.as_slice()).unwrap_or(&[])
    }

    /// Ids that depend on `id`.
    pub fn downstream(&self, id: &str) -> &[NodeId] {
        self.downstream.get(id).map(|n| n.as_slice()).unwrap_or(&[])
    }

    /// Check whether `to` is reachable from `from` by following downstream
    /// edges. A node always reaches itself.
    pub fn reaches_downstream(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for next in self.downstream(current) {
                if next.as_str() == to {
                    return true;
                }
                if visited.insert(next.as_str()) {
                    queue.push_back(next.as_str());
                }
            }
        }

        false
    }

    /// Order `ids` so that every node comes after all of its upstream
    /// dependencies, using Kahn's algorithm restricted to `ids`.
    ///
    /// Returns `Err` with one id that sits on a cycle if no such order exists.
    pub fn topological_order<'a, I>(&self, ids: I) -> Result<Vec<NodeId>, NodeId>
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        let ids: Vec<&NodeId> = ids.into_iter().collect();
        let id_set: HashSet<&str> = ids.iter().map(|id| id.as_str()).collect();
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut queue = VecDeque::new();
        let mut result = Vec::with_capacity(ids.len());

        // Only count edges between members of the set
        for id in &ids {
            let degree = self
                .upstream(id.as_str())
                .iter()
                .filter(|d| id_set.contains(d.as_str()))
                .count();
            in_degree.insert(id.as_str(), degree);
            if degree == 0 {
                queue.push_back(id.as_str());
            }
        }

        while let Some(id) = queue.pop_front() {
            result.push(NodeId::new(id));

            for dependent in self.downstream(id) {
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(dependent.as_str());
                    }
                }
            }
        }

        if result.len() < in_degree.len() {
            let stuck = in_degree
                .iter()
                .find(|(_, degree)| **degree > 0)
                .map(|(id, _)| NodeId::new(*id));
            if let Some(stuck) = stuck {
                return Err(stuck);
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<NodeId> {
        raw.iter().map(|s| NodeId::new(*s)).collect()
    }

    #[test]
    fn build_indexes_both_directions() {
        let edges = vec![Edge::new("a", "b"), Edge::new("a", "c"), Edge::new("b", "c")];
        let index = AdjacencyIndex::build(&edges);

        assert_eq!(index.downstream("a"), ids(&["b", "c"]).as_slice());
        assert_eq!(index.upstream("c"), ids(&["a", "b"]).as_slice());
        assert!(index.upstream("a").is_empty());
        assert!(index.downstream("missing").is_empty());
    }

    #[test]
    fn reachability_follows_downstream_edges() {
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "c")];
        let index = AdjacencyIndex::build(&edges);

        assert!(index.reaches_downstream("a", "c"));
        assert!(index.reaches_downstream("b", "b"));
        assert!(!index.reaches_downstream("c", "a"));
    }

    #[test]
    fn topological_order_puts_dependencies_first() {
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("a", "c")];
        let index = AdjacencyIndex::build(&edges);
        let nodes = ids(&["c", "b", "a"]);

        let order = index.topological_order(&nodes).unwrap();
        let pos = |id: &str| order.iter().position(|n| n.as_str() == id).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }

    #[test]
    fn topological_order_reports_cycles() {
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "a"), Edge::new("x", "a")];
        let index = AdjacencyIndex::build(&edges);
        let nodes = ids(&["a", "b", "x"]);

        let stuck = index.topological_order(&nodes).unwrap_err();
        assert!(stuck.as_str() == "a" || stuck.as_str() == "b");
    }
}
