//! Dependency Lock Table
//!
//! For every consumer, the lock table records which version of each upstream
//! dependency it was last built against. It is the only record of what a
//! component actually uses, and it is deliberately independent of the live
//! version of the upstream node so that drift can be observed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Upstream id -> version string recorded at the last build.
pub type LockMap = IndexMap<NodeId, String>;

/// Consumer id -> its lock map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockTable(IndexMap<NodeId, LockMap>);

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock map of `consumer`, if it has one.
    pub fn get(&self, consumer: &str) -> Option<&LockMap> {
        self.0.get(consumer)
    }

    /// The version `consumer` recorded for `dependency`.
    pub fn locked_version(&self, consumer: &str, dependency: &str) -> Option<&str> {
        self.0
            .get(consumer)
            .and_then(|locks| locks.get(dependency))
            .map(String::as_str)
    }

    pub fn has_consumer(&self, consumer: &str) -> bool {
        self.0.contains_key(consumer)
    }

    /// Start tracking `consumer` with an empty lock map, keeping any existing
    /// entries.
    pub fn track(&mut self, consumer: NodeId) {
        self.0.entry(consumer).or_default();
    }

    /// Record a lock only when `consumer` is already tracked.
    ///
    /// Returns whether the entry was written.
    pub fn record_if_tracked(
        &mut self,
        consumer: &str,
        dependency: NodeId,
        version: String,
    ) -> bool {
        match self.0.get_mut(consumer) {
            Some(locks) => {
                locks.insert(dependency, version);
                true
            }
            None => false,
        }
    }

    /// Record a lock, tracking `consumer` if it was not already.
    pub fn record(&mut self, consumer: NodeId, dependency: NodeId, version: String) {
        self.0.entry(consumer).or_default().insert(dependency, version);
    }

    /// Replace the whole lock map of `consumer`.
    pub fn replace(&mut self, consumer: NodeId, locks: LockMap) {
        self.0.insert(consumer, locks);
    }

    /// Stop tracking `consumer`.
    ///
    /// Entries in other consumers' maps that point at it are left in place.
    pub fn forget(&mut self, consumer: &str) -> Option<LockMap> {
        self.0.shift_remove(consumer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &LockMap)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(NodeId, LockMap)> for LockTable {
    fn from_iter<I: IntoIterator<Item = (NodeId, LockMap)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_if_tracked_skips_untracked_consumers() {
        let mut table = LockTable::new();
        assert!(!table.record_if_tracked("b", NodeId::new("a"), "1.0.0".into()));
        assert!(!table.has_consumer("b"));

        table.track(NodeId::new("b"));
        assert!(table.record_if_tracked("b", NodeId::new("a"), "1.0.0".into()));
        assert_eq!(table.locked_version("b", "a"), Some("1.0.0"));
    }

    #[test]
    fn forget_leaves_references_in_other_maps() {
        let mut table = LockTable::new();
        table.record(NodeId::new("b"), NodeId::new("a"), "1.0.0".into());
        table.track(NodeId::new("a"));

        table.forget("a");
        assert!(!table.has_consumer("a"));
        assert_eq!(table.locked_version("b", "a"), Some("1.0.0"));
    }

    #[test]
    fn serializes_as_nested_object() {
        let mut table = LockTable::new();
        table.record(NodeId::new("b"), NodeId::new("a"), "1.2.3".into());
        table.track(NodeId::new("a"));

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json, serde_json::json!({ "b": { "a": "1.2.3" }, "a": {} }));
    }
}
