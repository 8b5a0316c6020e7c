//! Session Limits

use serde::{Deserialize, Serialize};

/// Upper bounds enforced when loading a session document.
///
/// Hosts that read their own configuration can deserialize this directly;
/// missing fields fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLimits {
    pub max_nodes: usize,
    pub max_edges: usize,
    /// Release records per node.
    pub max_history: usize,
    /// Ids, labels, versions, links, and every other short string field.
    pub max_field_len: usize,
    pub max_changelog_len: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_nodes: 200,
            max_edges: 500,
            max_history: 50,
            max_field_len: 1000,
            max_changelog_len: 2000,
        }
    }
}
