//! Drift Reports

use serde::{Deserialize, Serialize};

/// A single drifted-dependency fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outlier {
    /// Display name of the drifted dependency.
    pub name: String,
    /// The dependency's live version.
    pub current: String,
    /// The version the consumer was built against.
    pub using: String,
}

/// Detailed drift status of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub is_outdated: bool,
    /// Direct outliers first, then transitive ones.
    pub outliers: Vec<Outlier>,
    pub is_transitively_outdated: bool,
}

impl DriftReport {
    /// Check whether the node is up to date with everything it consumes.
    pub fn is_current(&self) -> bool {
        !self.is_outdated
    }

    /// The reported outlier for a dependency display name, if any.
    pub fn outlier(&self, name: &str) -> Option<&Outlier> {
        self.outliers.iter().find(|o| o.name == name)
    }
}
