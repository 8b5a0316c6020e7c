//! Graph Store
//!
//! The store owns the source of truth (nodes, the edge list, and the lock
//! table) together with the adjacency index derived from the edges.
//!
//! # Invariants
//!
//! 1. The adjacency index is rebuilt after every change to the edge list,
//!    before the mutating method returns.
//! 2. Edges created through the store reference existing nodes and never
//!    close a cycle.
//! 3. Every mutating method validates all of its inputs before touching any
//!    state, so a returned error means nothing changed.

use indexmap::IndexMap;
use tracing::debug;

use super::adjacency::AdjacencyIndex;
use super::edge::Edge;
use super::locks::{LockMap, LockTable};
use super::node::{Node, NodeId};
use crate::error::{Error, Result};
use crate::version::Version;

/// Nodes, edges, and locks, plus the derived adjacency index.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// All nodes, in insertion order.
    nodes: IndexMap<NodeId, Node>,

    /// Edge list. Dangling entries are tolerated when loaded from a session.
    edges: Vec<Edge>,

    locks: LockTable,

    /// Derived from `edges`; never mutated directly.
    adjacency: AdjacencyIndex,
}

impl GraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a store from already-validated parts.
    pub(crate) fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>, locks: LockTable) -> Self {
        let adjacency = AdjacencyIndex::build(&edges);
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            edges,
            locks,
            adjacency,
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn locks(&self) -> &LockTable {
        &self.locks
    }

    pub fn adjacency(&self) -> &AdjacencyIndex {
        &self.adjacency
    }

    pub fn upstream(&self, id: &str) -> &[NodeId] {
        self.adjacency.upstream(id)
    }

    pub fn downstream(&self, id: &str) -> &[NodeId] {
        self.adjacency.downstream(id)
    }

    /// Current version of `id`, if it exists.
    pub fn current_version(&self, id: &str) -> Option<Version> {
        self.nodes.get(id).map(|n| n.version)
    }

    fn require(&self, id: &NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::UnknownNode(id.clone()))
    }

    fn require_mut(&mut self, id: &NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| Error::UnknownNode(id.clone()))
    }

    /// Fail if wiring `source` upstream of `target` would close a cycle.
    fn check_acyclic(&self, source: &NodeId, target: &NodeId) -> Result<()> {
        if self.adjacency.reaches_downstream(target.as_str(), source.as_str()) {
            return Err(Error::CycleDetected {
                from: source.clone(),
                to: target.clone(),
            });
        }
        Ok(())
    }

    fn rebuild_adjacency(&mut self) {
        self.adjacency = AdjacencyIndex::build(&self.edges);
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Insert a node and start tracking it with an empty lock map.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(Error::DuplicateId(node.id));
        }

        debug!(id = %node.id, version = %node.version, "adding node");
        self.locks.track(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove a node together with every edge that touches it.
    ///
    /// The node's own lock map goes with it. Locks that other consumers hold
    /// on it are left dangling; drift queries skip them.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node> {
        let node = self
            .nodes
            .shift_remove(id)
            .ok_or_else(|| Error::UnknownNode(id.clone()))?;

        let before = self.edges.len();
        self.edges.retain(|edge| !edge.touches(id));
        self.locks.forget(id.as_str());
        self.rebuild_adjacency();

        debug!(id = %id, removed_edges = before - self.edges.len(), "removed node");
        Ok(node)
    }

    /// Wire `source` upstream of `target`.
    ///
    /// If `target` is tracked in the lock table, it is recorded as already
    /// using the source's current version. Adding an edge that already exists
    /// is a no-op.
    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId) -> Result<()> {
        let version = self.require(source)?.version;
        self.require(target)?;

        if self
            .edges
            .iter()
            .any(|e| &e.source == source && &e.target == target)
        {
            debug!(source = %source, target = %target, "edge already present");
            return Ok(());
        }
        self.check_acyclic(source, target)?;

        self.edges.push(Edge::new(source.clone(), target.clone()));
        self.locks
            .record_if_tracked(target.as_str(), source.clone(), version.to_string());
        self.rebuild_adjacency();

        debug!(source = %source, target = %target, "added edge");
        Ok(())
    }

    /// Wire `source` upstream of `target` and lock `target` to the source's
    /// current version, tracking `target` if it had no lock map.
    pub fn add_locked_edge(&mut self, source: &NodeId, target: &NodeId) -> Result<()> {
        self.add_edge(source, target)?;
        let version = self.require(source)?.version;
        self.locks
            .record(target.clone(), source.clone(), version.to_string());
        Ok(())
    }

    /// Replace the upstream set of `target` in one step.
    ///
    /// All edges into `target` are dropped, one edge per id in `sources` is
    /// added, and the lock map of `target` is replaced with the current
    /// versions of exactly those sources. Duplicate ids are collapsed.
    pub fn replace_upstream(&mut self, target: &NodeId, sources: &[NodeId]) -> Result<()> {
        self.require(target)?;

        let mut locks = LockMap::new();
        for source in sources {
            let version = self.require(source)?.version;
            locks.insert(source.clone(), version.to_string());
        }

        // Edges into `target` do not affect what `target` reaches downstream,
        // so the existing index is valid for the cycle check.
        for source in locks.keys() {
            self.check_acyclic(source, target)?;
        }

        self.edges.retain(|edge| &edge.target != target);
        self.edges
            .extend(locks.keys().map(|source| Edge::new(source.clone(), target.clone())));
        self.locks.replace(target.clone(), locks);
        self.rebuild_adjacency();

        debug!(target = %target, upstream = sources.len(), "replaced upstream set");
        Ok(())
    }

    /// Relock `id` to the current version of every immediate upstream.
    pub fn relock(&mut self, id: &NodeId) -> Result<()> {
        self.require(id)?;

        let locks: LockMap = self
            .adjacency
            .upstream(id.as_str())
            .iter()
            .filter_map(|source| {
                self.nodes
                    .get(source)
                    .map(|n| (source.clone(), n.version.to_string()))
            })
            .collect();
        self.locks.replace(id.clone(), locks);
        Ok(())
    }

    /// Give `id` a new version. Versions never move backwards.
    pub(crate) fn set_version(&mut self, id: &NodeId, version: Version) -> Result<&mut Node> {
        let node = self.require_mut(id)?;
        debug_assert!(version >= node.version, "versions only move forward");
        node.version = version;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::Category;

    fn id(raw: &str) -> NodeId {
        NodeId::new(raw)
    }

    fn store_with(ids: &[&str]) -> GraphStore {
        let mut store = GraphStore::new();
        for raw in ids {
            store
                .add_node(Node::new(*raw, Version::initial(), Category::Foundation))
                .unwrap();
        }
        store
    }

    #[test]
    fn add_node_rejects_duplicates() {
        let mut store = store_with(&["a"]);
        let result = store.add_node(Node::new("a", Version::new(9, 0, 0), Category::Readers));
        assert!(matches!(result, Err(Error::DuplicateId(dup)) if dup.as_str() == "a"));
        assert_eq!(store.node("a").unwrap().version, Version::initial());
    }

    #[test]
    fn add_node_tracks_empty_lock_map() {
        let store = store_with(&["a"]);
        assert_eq!(store.locks().get("a").map(|l| l.len()), Some(0));
    }

    #[test]
    fn add_edge_seeds_lock_with_current_version() {
        let mut store = store_with(&["a", "b"]);
        store.set_version(&id("a"), Version::new(1, 4, 0)).unwrap();
        store.add_edge(&id("a"), &id("b")).unwrap();

        assert_eq!(store.locks().locked_version("b", "a"), Some("1.4.0"));
        assert_eq!(store.upstream("b"), &[id("a")]);
        assert_eq!(store.downstream("a"), &[id("b")]);
    }

    #[test]
    fn locked_edge_tracks_untracked_consumers() {
        let mut store = store_with(&["a", "b", "c"]);
        store.locks.forget("b");
        store.locks.forget("c");

        store.add_edge(&id("a"), &id("b")).unwrap();
        assert!(!store.locks().has_consumer("b"));

        store.add_locked_edge(&id("a"), &id("c")).unwrap();
        assert_eq!(store.locks().locked_version("c", "a"), Some("1.0.0"));
        assert_eq!(store.upstream("c"), &[id("a")]);
    }

    #[test]
    fn add_edge_rejects_unknown_nodes() {
        let mut store = store_with(&["a"]);
        assert!(matches!(
            store.add_edge(&id("a"), &id("ghost")),
            Err(Error::UnknownNode(_))
        ));
        assert!(matches!(
            store.add_edge(&id("ghost"), &id("a")),
            Err(Error::UnknownNode(_))
        ));
        assert!(store.edges().is_empty());
    }

    #[test]
    fn add_edge_rejects_cycles() {
        let mut store = store_with(&["a", "b", "c"]);
        store.add_edge(&id("a"), &id("b")).unwrap();
        store.add_edge(&id("b"), &id("c")).unwrap();

        assert!(matches!(
            store.add_edge(&id("c"), &id("a")),
            Err(Error::CycleDetected { .. })
        ));
        assert!(matches!(
            store.add_edge(&id("a"), &id("a")),
            Err(Error::CycleDetected { .. })
        ));
        assert_eq!(store.edges().len(), 2);
    }

    #[test]
    fn duplicate_edge_is_ignored() {
        let mut store = store_with(&["a", "b"]);
        store.add_edge(&id("a"), &id("b")).unwrap();
        store.add_edge(&id("a"), &id("b")).unwrap();
        assert_eq!(store.edges().len(), 1);
    }

    #[test]
    fn remove_node_cascades_edges() {
        let mut store = store_with(&["a", "b", "c"]);
        store.add_edge(&id("a"), &id("b")).unwrap();
        store.add_edge(&id("b"), &id("c")).unwrap();
        store.add_edge(&id("a"), &id("c")).unwrap();

        store.remove_node(&id("b")).unwrap();

        assert!(store.edges().iter().all(|e| !e.touches(&id("b"))));
        assert_eq!(store.edges().len(), 1);
        assert!(store.upstream("c").iter().all(|n| n.as_str() != "b"));
        assert!(!store.locks().has_consumer("b"));
        // c's lock on b stays behind
        assert_eq!(store.locks().locked_version("c", "b"), Some("1.0.0"));
    }

    #[test]
    fn replace_upstream_swaps_edges_and_locks() {
        let mut store = store_with(&["a", "b", "c", "d"]);
        store.add_edge(&id("a"), &id("d")).unwrap();
        store.add_edge(&id("b"), &id("d")).unwrap();
        store.set_version(&id("c"), Version::new(3, 0, 0)).unwrap();

        store
            .replace_upstream(&id("d"), &[id("c"), id("b"), id("c")])
            .unwrap();

        assert_eq!(store.upstream("d"), &[id("c"), id("b")]);
        let locks = store.locks().get("d").unwrap();
        assert_eq!(locks.len(), 2);
        assert_eq!(locks.get("c").map(String::as_str), Some("3.0.0"));
        assert!(locks.get("a").is_none());
    }

    #[test]
    fn replace_upstream_is_all_or_nothing() {
        let mut store = store_with(&["a", "b"]);
        store.add_edge(&id("a"), &id("b")).unwrap();

        let result = store.replace_upstream(&id("b"), &[id("ghost")]);
        assert!(matches!(result, Err(Error::UnknownNode(_))));
        assert_eq!(store.upstream("b"), &[id("a")]);

        let result = store.replace_upstream(&id("a"), &[id("b")]);
        assert!(matches!(result, Err(Error::CycleDetected { .. })));
        assert!(store.upstream("a").is_empty());
    }

    #[test]
    fn relock_records_current_upstream_versions() {
        let mut store = store_with(&["a", "b"]);
        store.add_edge(&id("a"), &id("b")).unwrap();
        store.set_version(&id("a"), Version::new(1, 0, 7)).unwrap();

        store.relock(&id("b")).unwrap();
        assert_eq!(store.locks().locked_version("b", "a"), Some("1.0.7"));
    }
}
