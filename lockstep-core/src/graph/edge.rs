//! Graph Edges

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// A directed dependency arc: `target` depends on `source`.
///
/// `source` is upstream, `target` is downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Check whether either endpoint is `id`.
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }
}
