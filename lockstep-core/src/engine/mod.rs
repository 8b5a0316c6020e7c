//! Dependency Graph Engine
//!
//! [`DependencyGraph`] is the single owner of the graph state. It exposes
//! the query surface (read-only, computed against the committed snapshot)
//! and the command surface (the only writers).
//!
//! # Commit Model
//!
//! Every command runs against a private copy of the current snapshot. The
//! copy replaces the committed snapshot only if the whole command succeeds,
//! so a failed command leaves no trace and readers never see a half-applied
//! change. Snapshots are reference counted; a caller holding one from
//! [`DependencyGraph::snapshot`] keeps a consistent view across commits.

mod draft;
mod shared;

pub use draft::NodeDraft;
pub use shared::SharedGraph;

use std::sync::Arc;

use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::drift::{DriftEngine, DriftReport};
use crate::error::{Error, Result};
use crate::graph::{Category, Edge, GraphStore, LockTable, Node, NodeId, Release};
use crate::reach::{self, UpstreamClosure};
use crate::session::{self, check_history, check_len, is_safe_link, SessionDocument, SessionLimits};
use crate::version::{BumpKind, Version};

/// The dependency graph consistency engine.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    store: Arc<GraphStore>,
    limits: SessionLimits,
}

impl DependencyGraph {
    /// Create an empty graph with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph that enforces `limits`.
    pub fn with_limits(limits: SessionLimits) -> Self {
        Self {
            store: Arc::default(),
            limits,
        }
    }

    /// Wrap an existing store.
    pub fn from_store(store: GraphStore) -> Self {
        Self {
            store: Arc::new(store),
            limits: SessionLimits::default(),
        }
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }

    /// The committed snapshot.
    pub fn snapshot(&self) -> Arc<GraphStore> {
        Arc::clone(&self.store)
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Apply `command` to a copy of the snapshot and commit it on success.
    fn commit<T, F>(&mut self, command: F) -> Result<T>
    where
        F: FnOnce(&mut GraphStore, &SessionLimits) -> Result<T>,
    {
        let mut next = GraphStore::clone(&self.store);
        let output = command(&mut next, &self.limits)?;

        if next.node_count() > self.limits.max_nodes {
            return Err(Error::validation(format!(
                "graph would hold {} nodes (limit {})",
                next.node_count(),
                self.limits.max_nodes
            )));
        }
        if next.edges().len() > self.limits.max_edges {
            return Err(Error::validation(format!(
                "graph would hold {} edges (limit {})",
                next.edges().len(),
                self.limits.max_edges
            )));
        }

        self.store = Arc::new(next);
        Ok(output)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn list_nodes(&self) -> impl Iterator<Item = &Node> {
        self.store.nodes()
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.store.node(id)
    }

    pub fn edges(&self) -> &[Edge] {
        self.store.edges()
    }

    pub fn lock_table(&self) -> &LockTable {
        self.store.locks()
    }

    pub fn upstream_of(&self, id: &str) -> &[NodeId] {
        self.store.upstream(id)
    }

    pub fn downstream_of(&self, id: &str) -> &[NodeId] {
        self.store.downstream(id)
    }

    pub fn is_outdated(&self, id: &str) -> bool {
        DriftEngine::new(&self.store).is_outdated(id)
    }

    /// Drift status of every node from a single memoized pass.
    pub fn status_map(&self) -> IndexMap<NodeId, bool> {
        DriftEngine::new(&self.store).status_map()
    }

    pub fn outlier_detail(&self, id: &str) -> DriftReport {
        DriftEngine::new(&self.store).outlier_detail(id)
    }

    /// Nodes to highlight around a hovered or selected node.
    pub fn related(&self, root: &str) -> IndexSet<NodeId> {
        reach::related(self.store.adjacency(), &NodeId::new(root))
    }

    pub fn upstream_closure(&self, id: &str) -> UpstreamClosure {
        reach::upstream_closure(self.store.adjacency(), &NodeId::new(id))
    }

    /// Every tier in display order, each with its nodes in insertion order.
    pub fn nodes_by_category(&self) -> IndexMap<Category, Vec<&Node>> {
        let mut groups: IndexMap<Category, Vec<&Node>> =
            Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
        for node in self.store.nodes() {
            groups.entry(node.category).or_default().push(node);
        }
        groups
    }

    /// Most recent releases of `id`, newest first.
    pub fn recent_releases(&self, id: &str, limit: usize) -> Result<Vec<&Release>> {
        self.store
            .node(id)
            .map(|node| node.recent_releases(limit))
            .ok_or_else(|| Error::UnknownNode(NodeId::new(id)))
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Insert a node. Its history must meet the same bounds as a loaded
    /// session.
    pub fn add_node(&mut self, mut node: Node) -> Result<()> {
        node.clear_empty_links();
        self.commit(|store, limits| {
            check_node_fields(&node, limits)?;
            store.add_node(node)
        })
    }

    /// Create a component and wire it upstream of its consumers.
    ///
    /// Each consumer is recorded as using the new component's initial
    /// version, including consumers that had no lock map yet. Returns the
    /// derived id.
    pub fn create_dependency(&mut self, draft: NodeDraft) -> Result<NodeId> {
        let node = draft.to_node();
        if node.id.as_str().is_empty() {
            return Err(Error::validation("a new dependency needs a name"));
        }

        self.commit(|store, limits| {
            check_node_fields(&node, limits)?;
            let id = node.id.clone();
            store.add_node(node)?;
            for consumer in &draft.consumers {
                store.add_locked_edge(&id, consumer)?;
            }
            debug!(id = %id, consumers = draft.consumers.len(), "created dependency");
            Ok(id)
        })
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<Node> {
        let id = NodeId::new(id);
        self.commit(|store, _| store.remove_node(&id))
    }

    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<()> {
        let (source, target) = (NodeId::new(source), NodeId::new(target));
        self.commit(|store, _| store.add_edge(&source, &target))
    }

    /// Replace the full upstream set of `target`, relocking it to the
    /// current versions of the new upstreams.
    pub fn replace_upstream<I, S>(&mut self, target: &str, sources: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        let target = NodeId::new(target);
        let sources: Vec<NodeId> = sources.into_iter().map(Into::into).collect();
        self.commit(|store, _| store.replace_upstream(&target, &sources))
    }

    /// Edit the declared dependencies of `target` and publish the resulting
    /// patch release.
    pub fn edit_dependencies<I, S>(&mut self, target: &str, sources: I) -> Result<Version>
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        let target = NodeId::new(target);
        let sources: Vec<NodeId> = sources.into_iter().map(Into::into).collect();
        self.commit(|store, limits| {
            store.replace_upstream(&target, &sources)?;
            publish(store, limits, &target, BumpKind::Patch, None, None)
        })
    }

    /// Bump the version of `id` and append a release record.
    ///
    /// Consumers keep their locks, so they become drifted until rebuilt.
    pub fn bump_and_publish(
        &mut self,
        id: &str,
        kind: BumpKind,
        pr_link: Option<&str>,
        changelog: Option<&str>,
    ) -> Result<Version> {
        let id = NodeId::new(id);
        self.commit(|store, limits| publish(store, limits, &id, kind, pr_link, changelog))
    }

    /// Relock `id` to the current versions of its immediate upstreams and
    /// publish a patch release.
    ///
    /// Only `id`'s own locks change; its consumers may now be drifted.
    pub fn rebuild(&mut self, id: &str) -> Result<Version> {
        let id = NodeId::new(id);
        self.commit(|store, limits| {
            store.relock(&id)?;
            publish(store, limits, &id, BumpKind::Patch, None, None)
        })
    }

    // ------------------------------------------------------------------
    // Session boundary
    // ------------------------------------------------------------------

    pub fn serialize(&self) -> SessionDocument {
        session::encode(&self.store)
    }

    pub fn to_json(&self) -> Result<String> {
        self.serialize().to_json()
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        self.serialize().to_msgpack()
    }

    /// Replace the whole state with a validated session.
    ///
    /// On error the current state is untouched.
    pub fn load_session(&mut self, document: serde_json::Value) -> Result<()> {
        let session = session::decode(document, &self.limits)?;
        self.install(session);
        Ok(())
    }

    pub fn load_session_str(&mut self, json: &str) -> Result<()> {
        let session = session::decode_str(json, &self.limits)?;
        self.install(session);
        Ok(())
    }

    pub fn load_session_msgpack(&mut self, bytes: &[u8]) -> Result<()> {
        let session = session::decode_msgpack(bytes, &self.limits)?;
        self.install(session);
        Ok(())
    }

    fn install(&mut self, session: SessionDocument) {
        debug!(
            nodes = session.nodes.len(),
            edges = session.edges.len(),
            "loaded session"
        );
        self.store = Arc::new(session.into_store());
    }
}

fn check_node_fields(node: &Node, limits: &SessionLimits) -> Result<()> {
    check_len(node.id.as_str(), limits.max_field_len, "id")?;
    for (value, what) in [
        (&node.label, "label"),
        (&node.org, "org"),
        (&node.artifact_id, "artifactId"),
    ] {
        if let Some(value) = value {
            check_len(value, limits.max_field_len, what)?;
        }
    }
    check_history(&node.history, &format!("node `{}`", node.id), limits)
}

/// Bump `id` and append a release. History is append-only, so a node whose
/// history is full cannot publish.
fn publish(
    store: &mut GraphStore,
    limits: &SessionLimits,
    id: &NodeId,
    kind: BumpKind,
    pr_link: Option<&str>,
    changelog: Option<&str>,
) -> Result<Version> {
    let pr_link = pr_link.filter(|link| !link.is_empty());
    if let Some(link) = pr_link {
        check_len(link, limits.max_field_len, "prLink")?;
        if !is_safe_link(link) {
            return Err(Error::InvalidLink(link.to_string()));
        }
    }
    let changelog = changelog.unwrap_or_default();
    check_len(changelog, limits.max_changelog_len, "changelog")?;

    let node = store
        .node(id.as_str())
        .ok_or_else(|| Error::UnknownNode(id.clone()))?;
    if node.history.len() >= limits.max_history {
        return Err(Error::validation(format!(
            "`{id}` already has {} releases (limit {})",
            node.history.len(),
            limits.max_history
        )));
    }
    let current = node.version;
    let next = current.bump(kind)?;

    let node = store.set_version(id, next)?;
    node.history.push(Release {
        version: next,
        date: Utc::now(),
        changelog: changelog.to_string(),
        pr_link: pr_link.map(str::to_string),
    });

    debug!(id = %id, from = %current, to = %next, "published release");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph
            .add_node(Node::new("a", Version::new(1, 0, 0), Category::Foundation).with_label("A"))
            .unwrap();
        graph
            .add_node(Node::new("b", Version::new(1, 0, 0), Category::DataAccess).with_label("B"))
            .unwrap();
        graph
            .add_node(Node::new("c", Version::new(2, 1, 0), Category::Readers).with_label("C"))
            .unwrap();
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("b", "c").unwrap();
        graph
    }

    #[test]
    fn failed_command_leaves_state_untouched() {
        let mut graph = graph();
        let before = graph.serialize();

        assert!(graph.add_edge("c", "a").is_err());
        assert!(graph.replace_upstream("c", ["a", "ghost"]).is_err());
        assert!(graph
            .bump_and_publish("a", BumpKind::Minor, Some("javascript:alert(1)"), None)
            .is_err());

        assert_eq!(graph.serialize(), before);
    }

    #[test]
    fn snapshots_survive_commits() {
        let mut graph = graph();
        let snapshot = graph.snapshot();

        graph.bump_and_publish("a", BumpKind::Major, None, None).unwrap();

        assert_eq!(snapshot.current_version("a"), Some(Version::new(1, 0, 0)));
        assert_eq!(graph.store().current_version("a"), Some(Version::new(2, 0, 0)));
    }

    #[test]
    fn publish_records_history() {
        let mut graph = graph();
        let version = graph
            .bump_and_publish(
                "a",
                BumpKind::Minor,
                Some("https://example.com/pr/1"),
                Some("adds things"),
            )
            .unwrap();
        assert_eq!(version, Version::new(1, 1, 0));

        let node = graph.get_node("a").unwrap();
        assert_eq!(node.version, version);
        let release = node.history.last().unwrap();
        assert_eq!(release.version, version);
        assert_eq!(release.changelog, "adds things");
        assert_eq!(release.pr_link.as_deref(), Some("https://example.com/pr/1"));
    }

    #[test]
    fn empty_link_is_not_recorded() {
        let mut graph = graph();
        graph.bump_and_publish("a", BumpKind::Patch, Some(""), None).unwrap();
        assert!(graph.get_node("a").unwrap().history[0].pr_link.is_none());
    }

    #[test]
    fn full_history_refuses_to_publish() {
        let mut graph = DependencyGraph::with_limits(SessionLimits {
            max_history: 3,
            ..SessionLimits::default()
        });
        graph
            .add_node(Node::new("a", Version::initial(), Category::Foundation))
            .unwrap();
        for _ in 0..3 {
            graph.bump_and_publish("a", BumpKind::Patch, None, None).unwrap();
        }

        assert!(matches!(
            graph.bump_and_publish("a", BumpKind::Patch, None, None),
            Err(Error::Validation(_))
        ));
        assert!(graph.rebuild("a").is_err());

        let node = graph.get_node("a").unwrap();
        assert_eq!(node.version, Version::new(1, 0, 3));
        let versions: Vec<Version> = node.history.iter().map(|r| r.version).collect();
        assert_eq!(
            versions,
            [Version::new(1, 0, 1), Version::new(1, 0, 2), Version::new(1, 0, 3)]
        );
    }

    #[test]
    fn bump_past_the_ceiling_is_refused() {
        let mut graph = DependencyGraph::new();
        graph
            .add_node(Node::new("a", Version::new(1, 0, u32::MAX), Category::Foundation))
            .unwrap();
        let before = graph.serialize();

        assert!(matches!(
            graph.bump_and_publish("a", BumpKind::Patch, None, None),
            Err(Error::Format { .. })
        ));
        assert_eq!(graph.serialize(), before);

        // A minor bump resets patch and still succeeds
        assert_eq!(
            graph.bump_and_publish("a", BumpKind::Minor, None, None).unwrap(),
            Version::new(1, 1, 0)
        );
    }

    fn with_history(id: &str, releases: Vec<Release>) -> Node {
        let mut node = Node::new(id, Version::initial(), Category::Foundation);
        node.history = releases;
        node
    }

    fn release(changelog: &str, pr_link: Option<&str>) -> Release {
        Release {
            version: Version::new(1, 0, 1),
            date: Utc::now(),
            changelog: changelog.to_string(),
            pr_link: pr_link.map(str::to_string),
        }
    }

    #[test]
    fn add_node_checks_history() {
        let mut graph = graph();
        let before = graph.serialize();

        let unsafe_link = with_history("x", vec![release("", Some("javascript:alert(1)"))]);
        assert!(matches!(graph.add_node(unsafe_link), Err(Error::InvalidLink(_))));

        let releases = (0..60).map(|_| release(&"c".repeat(3000), None)).collect();
        let oversized = with_history("y", releases);
        assert!(matches!(graph.add_node(oversized), Err(Error::Validation(_))));

        let long_changelog = with_history("z", vec![release(&"c".repeat(2001), None)]);
        assert!(matches!(graph.add_node(long_changelog), Err(Error::Validation(_))));

        assert_eq!(graph.serialize(), before);
    }

    #[test]
    fn added_history_survives_a_reload() {
        let mut graph = graph();
        graph
            .add_node(with_history(
                "x",
                vec![release("first", Some("https://example.com/pr/9")), release("", Some(""))],
            ))
            .unwrap();
        assert!(graph.get_node("x").unwrap().history[1].pr_link.is_none());

        let document = graph.serialize();
        let mut restored = DependencyGraph::new();
        restored.load_session(document.to_value().unwrap()).unwrap();
        assert_eq!(restored.serialize(), document);
    }

    #[test]
    fn edge_limit_is_enforced() {
        let mut graph = DependencyGraph::with_limits(SessionLimits {
            max_edges: 2,
            ..SessionLimits::default()
        });
        for id in ["a", "b", "c"] {
            graph
                .add_node(Node::new(id, Version::initial(), Category::Foundation))
                .unwrap();
        }
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("a", "c").unwrap();

        assert!(matches!(graph.add_edge("b", "c"), Err(Error::Validation(_))));
        assert_eq!(graph.edges().len(), 2);
        assert_eq!(graph.upstream_of("c"), &[NodeId::new("a")]);
    }

    #[test]
    fn node_limit_is_enforced() {
        let mut graph = DependencyGraph::with_limits(SessionLimits {
            max_nodes: 1,
            ..SessionLimits::default()
        });
        graph
            .add_node(Node::new("a", Version::initial(), Category::Foundation))
            .unwrap();
        assert!(matches!(
            graph.add_node(Node::new("b", Version::initial(), Category::Foundation)),
            Err(Error::Validation(_))
        ));
        assert_eq!(graph.list_nodes().count(), 1);
    }

    #[test]
    fn rebuild_clears_direct_drift_only() {
        let mut graph = graph();
        graph.bump_and_publish("a", BumpKind::Patch, None, None).unwrap();
        assert!(graph.is_outdated("b"));

        let rebuilt = graph.rebuild("b").unwrap();
        assert_eq!(rebuilt, Version::new(1, 0, 1));
        assert!(!graph.is_outdated("b"));
        assert_eq!(graph.lock_table().locked_version("b", "a"), Some("1.0.1"));

        // c still locks b@1.0.0
        assert!(graph.is_outdated("c"));
        graph.rebuild("c").unwrap();
        assert!(!graph.is_outdated("c"));
    }

    #[test]
    fn edit_dependencies_relocks_and_publishes() {
        let mut graph = graph();
        let version = graph.edit_dependencies("c", ["a"]).unwrap();

        assert_eq!(version, Version::new(2, 1, 1));
        assert_eq!(graph.upstream_of("c"), &[NodeId::new("a")]);
        assert!(graph.lock_table().locked_version("c", "b").is_none());
        assert!(graph.downstream_of("b").is_empty());
    }

    #[test]
    fn create_dependency_wires_consumers() {
        let mut graph = graph();
        let id = graph
            .create_dependency(
                NodeDraft::new("Metrics Lib", Category::Foundation)
                    .coordinates("core", "metrics-lib")
                    .version(Version::new(0, 3, 0))
                    .consumed_by(["b", "c"]),
            )
            .unwrap();

        assert_eq!(id.as_str(), "core:metrics-lib");
        let node = graph.get_node("core:metrics-lib").unwrap();
        assert_eq!(node.display_name(), "Metrics Lib");
        assert_eq!(node.kind, Some(crate::graph::NodeKind::Core));
        assert_eq!(graph.lock_table().locked_version("b", "core:metrics-lib"), Some("0.3.0"));
        assert!(graph.lock_table().get("core:metrics-lib").unwrap().is_empty());
        assert!(!graph.is_outdated("c"));
    }

    #[test]
    fn create_dependency_is_atomic() {
        let mut graph = graph();
        let draft = NodeDraft::new("x", Category::Foundation).consumed_by(["b", "ghost"]);
        let result = graph.create_dependency(draft);

        assert!(matches!(result, Err(Error::UnknownNode(_))));
        assert!(graph.get_node("x").is_none());
        assert!(graph.downstream_of("x").is_empty());
    }

    #[test]
    fn create_dependency_locks_untracked_consumers() {
        let mut graph = DependencyGraph::new();
        graph
            .load_session(serde_json::json!({
                "nodes": [{ "id": "app", "version": "1.0.0" }],
                "edges": [],
                "dependencyLocks": {}
            }))
            .unwrap();
        assert!(!graph.lock_table().has_consumer("app"));

        graph
            .create_dependency(NodeDraft::new("util", Category::Foundation).consumed_by(["app"]))
            .unwrap();
        assert_eq!(graph.lock_table().locked_version("app", "util"), Some("1.0.0"));

        graph.bump_and_publish("util", BumpKind::Patch, None, None).unwrap();
        assert!(graph.is_outdated("app"));
    }

    #[test]
    fn create_dependency_rejects_duplicates_and_blank_names() {
        let mut graph = graph();
        assert!(matches!(
            graph.create_dependency(NodeDraft::new("A", Category::Foundation)),
            Err(Error::DuplicateId(_))
        ));
        assert!(matches!(
            graph.create_dependency(NodeDraft::new("   ", Category::Foundation)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn nodes_are_grouped_by_category() {
        let graph = graph();
        let groups = graph.nodes_by_category();

        let tiers: Vec<Category> = groups.keys().copied().collect();
        assert_eq!(tiers, Category::ALL.to_vec());
        assert_eq!(groups[&Category::Foundation].len(), 1);
        assert!(groups[&Category::Processors].is_empty());
    }

    #[test]
    fn recent_releases_of_unknown_node_fails() {
        assert!(matches!(
            graph().recent_releases("ghost", 5),
            Err(Error::UnknownNode(_))
        ));
    }
}
