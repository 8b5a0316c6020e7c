//! Graph Nodes
//!
//! This module defines the records that live in the dependency graph: the
//! node id, the tier a component belongs to, and its release history.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::version::Version;

/// Unique identifier for a node in the dependency graph.
///
/// Ids are stable keys: they are fixed at creation and never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap a raw id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an id the way new components are named.
    ///
    /// `org:artifactId` (lower-cased) when both coordinates are present,
    /// otherwise the display name lower-cased with whitespace runs replaced
    /// by `-`. Leading and trailing whitespace is dropped, so a blank name
    /// derives an empty id.
    pub fn derive(org: Option<&str>, artifact_id: Option<&str>, name: &str) -> Self {
        match (org.filter(|o| !o.is_empty()), artifact_id.filter(|a| !a.is_empty())) {
            (Some(org), Some(artifact)) => Self(format!("{org}:{artifact}").to_lowercase()),
            _ => Self(
                name.to_lowercase()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join("-"),
            ),
        }
    }

    /// Get the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The tier a component belongs to.
///
/// Tiers are used for grouping and display only; they carry no traversal
/// semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Foundation,
    #[serde(rename = "Data Access")]
    DataAccess,
    Readers,
    Processors,
}

impl Category {
    /// All tiers in display order.
    pub const ALL: [Category; 4] = [
        Category::Foundation,
        Category::DataAccess,
        Category::Readers,
        Category::Processors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Foundation => "Foundation",
            Category::DataAccess => "Data Access",
            Category::Readers => "Readers",
            Category::Processors => "Processors",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad kind of component, used to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Shared foundation library.
    Core,
    /// Data-access library.
    Repo,
    /// Application or service at the bottom of the graph.
    App,
}

impl NodeKind {
    /// The kind a newly created component in `category` gets.
    pub fn for_new(category: Category) -> Self {
        match category {
            Category::Foundation => NodeKind::Core,
            _ => NodeKind::Repo,
        }
    }
}

/// One published release of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub version: Version,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub changelog: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_link: Option<String>,
}

/// A versioned component in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Stable key. Immutable after creation.
    pub id: NodeId,

    /// Human-readable name. Falls back to the id when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,

    /// Current published version. Replaced only by bumping.
    #[serde(default)]
    pub version: Version,

    #[serde(default)]
    pub category: Category,

    /// Release records, oldest first. Append-only.
    #[serde(default)]
    pub history: Vec<Release>,
}

impl Node {
    /// Create a node with no optional metadata and an empty history.
    pub fn new(id: impl Into<NodeId>, version: Version, category: Category) -> Self {
        Self {
            id: id.into(),
            label: None,
            org: None,
            artifact_id: None,
            kind: None,
            version,
            category,
            history: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_coordinates(
        mut self,
        org: impl Into<String>,
        artifact_id: impl Into<String>,
    ) -> Self {
        self.org = Some(org.into());
        self.artifact_id = Some(artifact_id.into());
        self
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// The name shown to users and used to key outlier entries.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }

    /// An empty `prLink` means the release has no link.
    pub(crate) fn clear_empty_links(&mut self) {
        for release in &mut self.history {
            if release.pr_link.as_deref() == Some("") {
                release.pr_link = None;
            }
        }
    }

    /// Release history, most recent first, truncated to `limit` entries.
    pub fn recent_releases(&self, limit: usize) -> Vec<&Release> {
        let mut releases: Vec<&Release> = self.history.iter().collect();
        releases.sort_by(|a, b| b.date.cmp(&a.date));
        releases.truncate(limit);
        releases
    }
}
