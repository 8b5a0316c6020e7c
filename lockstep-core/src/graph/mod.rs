//! Dependency Graph
//!
//! This module implements the graph of versioned components and the records
//! that tie them together.
//!
//! # Overview
//!
//! The dependency graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes are versioned components (libraries, applications, services)
//! - Edges are dependencies: if B depends on A, there is an edge from A to B
//! - The lock table records which version of A that B was last built against
//!
//! Nodes, edges, and locks are the source of truth. The adjacency index is a
//! derived cache that is rebuilt every time the edge list changes.
//!
//! # Design Decisions
//!
//! 1. Locks are stored separately from node versions. A node's version can
//!    move on while its consumers still record the old one; that gap is what
//!    drift detection looks for.
//!
//! 2. The graph is indexed by node id for O(1) lookups, with insertion order
//!    preserved for listing and serialization.
//!
//! 3. We maintain both upstream and downstream mappings to enable efficient
//!    traversal in both directions.

mod adjacency;
mod edge;
mod locks;
mod node;
mod store;

pub use adjacency::AdjacencyIndex;
pub use edge::Edge;
pub use locks::{LockMap, LockTable};
pub use node::{Category, Node, NodeId, NodeKind, Release};
pub use store::GraphStore;
