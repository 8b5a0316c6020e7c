//! Drift Engine
//!
//! A node is *drifted* when it was built against a dependency version that is
//! no longer current, either directly (one of its own locks is stale) or
//! transitively (something upstream of it is drifted).
//!
//! # How It Works
//!
//! 1. Direct check: compare every entry in the node's lock map against the
//!    live version of that dependency. Locks on nodes that no longer exist
//!    are skipped.
//!
//! 2. Transitive check: recurse into every immediate upstream id.
//!
//! 3. Results are memoized per engine, so a node reachable over many paths
//!    is evaluated once. An engine borrows one committed snapshot of the
//!    store; build a new engine after every mutation.
//!
//! # Cycles
//!
//! Mutations refuse to create cycles, but the engine still tracks which
//! nodes are on the current recursion path. Re-entering one of them is
//! reported conservatively as outdated instead of recursing forever.

mod report;

pub use report::{DriftReport, Outlier};

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::warn;

use crate::graph::{GraphStore, NodeId};

/// Evaluation state of one node within an engine.
#[derive(Debug, Clone)]
enum Visit<T> {
    /// On the current recursion path.
    InProgress,
    /// Fully evaluated.
    Done(T),
}

/// Memoizing drift queries over one store snapshot.
pub struct DriftEngine<'a> {
    store: &'a GraphStore,
    status: HashMap<NodeId, Visit<bool>>,
    details: HashMap<NodeId, Visit<DriftReport>>,
}

impl<'a> DriftEngine<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self {
            store,
            status: HashMap::new(),
            details: HashMap::new(),
        }
    }

    /// Check whether any direct lock of `id` is stale.
    fn has_direct_drift(&self, id: &str) -> bool {
        let Some(locks) = self.store.locks().get(id) else {
            return false;
        };
        locks.iter().any(|(dep, locked)| {
            self.store
                .current_version(dep.as_str())
                .is_some_and(|current| current.to_string() != *locked)
        })
    }

    /// Whether `id` is drifted, directly or transitively.
    ///
    /// Unknown ids are never outdated.
    pub fn is_outdated(&mut self, id: &str) -> bool {
        match self.status.get(id) {
            Some(Visit::Done(outdated)) => return *outdated,
            Some(Visit::InProgress) => {
                warn!(id = %id, "dependency cycle reached during drift check");
                return true;
            }
            None => {}
        }

        let store = self.store;
        let Some(node) = store.node(id) else {
            return false;
        };

        self.status.insert(node.id.clone(), Visit::InProgress);

        let outdated = self.has_direct_drift(id)
            || store
                .upstream(id)
                .iter()
                .any(|dep| self.is_outdated(dep.as_str()));

        self.status.insert(node.id.clone(), Visit::Done(outdated));
        outdated
    }

    /// `is_outdated` for every node, in insertion order, from one pass.
    pub fn status_map(&mut self) -> IndexMap<NodeId, bool> {
        let store = self.store;
        store
            .nodes()
            .map(|node| (node.id.clone(), self.is_outdated(node.id.as_str())))
            .collect()
    }

    /// Full drift report for `id`, listing every drifted dependency.
    ///
    /// Transitive outliers are merged by display name; the first one seen
    /// wins, so two drifted dependencies that share a name are reported once.
    pub fn outlier_detail(&mut self, id: &str) -> DriftReport {
        match self.details.get(id) {
            Some(Visit::Done(report)) => return report.clone(),
            Some(Visit::InProgress) => {
                warn!(id = %id, "dependency cycle reached during drift report");
                return DriftReport {
                    is_outdated: true,
                    ..DriftReport::default()
                };
            }
            None => {}
        }

        let store = self.store;
        let Some(node) = store.node(id) else {
            return DriftReport::default();
        };

        self.details.insert(node.id.clone(), Visit::InProgress);

        let mut outliers: Vec<Outlier> = store
            .locks()
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|(dep, locked)| {
                let dependency = store.node(dep.as_str())?;
                let current = dependency.version.to_string();
                (current != *locked).then(|| Outlier {
                    name: dependency.display_name().to_string(),
                    current,
                    using: locked.clone(),
                })
            })
            .collect();

        let mut transitive: IndexMap<String, Outlier> = IndexMap::new();
        let mut is_transitively_outdated = false;
        for dep in store.upstream(id) {
            let upstream = self.outlier_detail(dep.as_str());
            if upstream.is_outdated {
                is_transitively_outdated = true;
                for outlier in upstream.outliers {
                    transitive.entry(outlier.name.clone()).or_insert(outlier);
                }
            }
        }

        let is_outdated = !outliers.is_empty() || is_transitively_outdated;
        outliers.extend(transitive.into_values());

        let report = DriftReport {
            is_outdated,
            outliers,
            is_transitively_outdated,
        };
        self.details
            .insert(node.id.clone(), Visit::Done(report.clone()));
        report
    }
}
