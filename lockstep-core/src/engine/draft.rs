//! New Dependency Drafts

use crate::graph::{Category, Node, NodeId, NodeKind};
use crate::version::Version;

/// Everything needed to create a component and wire it into its consumers.
#[derive(Debug, Clone)]
pub struct NodeDraft {
    /// Display name. Also the id source when coordinates are missing.
    pub name: String,
    pub org: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Version,
    pub category: Category,
    /// Existing nodes that will depend on the new one.
    pub consumers: Vec<NodeId>,
}

impl NodeDraft {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            org: None,
            artifact_id: None,
            version: Version::initial(),
            category,
            consumers: Vec::new(),
        }
    }

    pub fn coordinates(mut self, org: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self.artifact_id = Some(artifact_id.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn consumed_by<I, S>(mut self, consumers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.consumers.extend(consumers.into_iter().map(Into::into));
        self
    }

    /// The id the new node will get.
    pub fn id(&self) -> NodeId {
        NodeId::derive(self.org.as_deref(), self.artifact_id.as_deref(), &self.name)
    }

    pub(crate) fn to_node(&self) -> Node {
        let mut node = Node::new(self.id(), self.version, self.category)
            .with_label(self.name.clone())
            .with_kind(NodeKind::for_new(self.category));
        node.org = self.org.clone().filter(|o| !o.is_empty());
        node.artifact_id = self.artifact_id.clone().filter(|a| !a.is_empty());
        node
    }
}
