//! Session Document
//!
//! The persisted form of a whole graph. The field names `nodes`, `edges`,
//! and `dependencyLocks` are a contract other tooling relies on.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{Edge, GraphStore, LockTable, Node};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub dependency_locks: LockTable,
}

impl SessionDocument {
    /// Snapshot a store verbatim.
    pub fn from_store(store: &GraphStore) -> Self {
        Self {
            nodes: store.nodes().cloned().collect(),
            edges: store.edges().to_vec(),
            dependency_locks: store.locks().clone(),
        }
    }

    pub(crate) fn into_store(self) -> GraphStore {
        GraphStore::from_parts(self.nodes, self.edges, self.dependency_locks)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Encode as MessagePack with named fields, so the result decodes back
    /// through the same validator as JSON.
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }
}
