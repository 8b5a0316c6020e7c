//! Seed Graphs
//!
//! Ready-made graphs for demos, tests, and benchmarks: a fixed catalogue of
//! twelve components, and a random layered graph that is acyclic by
//! construction.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::DependencyGraph;
use crate::error::Result;
use crate::graph::{Category, GraphStore, Node, NodeId, NodeKind};
use crate::version::Version;

fn component(
    org: &str,
    artifact: &str,
    kind: NodeKind,
    version: Version,
    category: Category,
) -> Node {
    Node::new(format!("{org}:{artifact}"), version, category)
        .with_label(artifact)
        .with_coordinates(org, artifact)
        .with_kind(kind)
}

/// The fixed catalogue: two foundation libraries, five data-access
/// libraries, three readers, and two processors, all locked to current
/// versions.
pub fn sample() -> Result<DependencyGraph> {
    use Category::*;
    use NodeKind::*;

    let nodes = [
        component("core", "ext-models", Core, Version::new(1, 0, 0), Foundation),
        component("core", "common-lib", Core, Version::new(1, 0, 0), Foundation),
        component("data", "repo-a", Repo, Version::new(1, 0, 0), DataAccess),
        component("data", "repo-b", Repo, Version::new(1, 0, 0), DataAccess),
        component("data", "repo-c", Repo, Version::new(1, 0, 0), DataAccess),
        component("data", "repo-d", Repo, Version::new(1, 0, 0), DataAccess),
        component("data", "repo-e", Repo, Version::new(1, 0, 0), DataAccess),
        component("app", "reader-a", App, Version::new(2, 1, 0), Readers),
        component("app", "reader-b", App, Version::new(2, 0, 4), Readers),
        component("app", "reader-c", App, Version::new(2, 1, 1), Readers),
        component("app", "proc-a", App, Version::new(1, 5, 0), Processors),
        component("app", "proc-b", App, Version::new(1, 2, 0), Processors),
    ];

    let edges = [
        ("core:ext-models", "core:common-lib"),
        ("core:common-lib", "app:reader-a"),
        ("core:common-lib", "app:reader-b"),
        ("core:common-lib", "app:reader-c"),
        ("core:common-lib", "app:proc-a"),
        ("core:common-lib", "app:proc-b"),
        ("data:repo-a", "app:reader-a"),
        ("data:repo-c", "app:reader-a"),
        ("data:repo-d", "app:reader-a"),
        ("data:repo-b", "app:reader-b"),
        ("data:repo-c", "app:reader-b"),
        ("data:repo-e", "app:reader-b"),
        ("data:repo-a", "app:reader-c"),
        ("data:repo-d", "app:reader-c"),
        ("data:repo-e", "app:reader-c"),
        ("data:repo-a", "app:proc-a"),
        ("data:repo-b", "app:proc-a"),
        ("data:repo-c", "app:proc-b"),
        ("data:repo-d", "app:proc-b"),
    ];

    let mut store = GraphStore::new();
    for node in nodes {
        store.add_node(node)?;
    }
    for (source, target) in edges {
        store.add_edge(&NodeId::new(source), &NodeId::new(target))?;
    }
    Ok(DependencyGraph::from_store(store))
}

/// Which tiers feed which, and the most upstreams a consumer draws from
/// each. Edges only point down the tier order, so the graph is acyclic.
const WIRING: [(Category, Category, usize); 5] = [
    (Category::Foundation, Category::DataAccess, 2),
    (Category::Foundation, Category::Readers, 1),
    (Category::DataAccess, Category::Readers, 2),
    (Category::DataAccess, Category::Processors, 2),
    (Category::Readers, Category::Processors, 1),
];

fn tier_layout(category: Category) -> (&'static str, NodeKind, &'static [&'static str]) {
    const FOUNDATION: &[&str] = &["common", "shared", "base", "ext"];
    const DATA_ACCESS: &[&str] = &["repo", "store", "db", "cache"];
    const READERS: &[&str] = &["reader", "api", "service", "view"];
    const PROCESSORS: &[&str] = &["proc", "worker", "engine", "handler"];

    match category {
        Category::Foundation => ("core", NodeKind::Core, FOUNDATION),
        Category::DataAccess => ("data", NodeKind::Repo, DATA_ACCESS),
        Category::Readers => ("app", NodeKind::App, READERS),
        Category::Processors => ("app", NodeKind::App, PROCESSORS),
    }
}

/// A random layered graph with 2-4 components per tier and random versions.
///
/// Consumers start locked to the current version of every upstream.
pub fn random<R: Rng>(rng: &mut R) -> Result<DependencyGraph> {
    let mut store = GraphStore::new();
    let mut tiers: Vec<(Category, Vec<NodeId>)> = Vec::new();

    for category in Category::ALL {
        let (org, kind, prefixes) = tier_layout(category);
        let count = rng.gen_range(2..=4);
        let mut ids = Vec::with_capacity(count);

        for i in 0..count {
            let prefix = prefixes.choose(rng).copied().unwrap_or("lib");
            // The letter suffix keeps ids unique within a tier
            let artifact = format!("{prefix}-{}", char::from(b'a' + i as u8));
            let version = Version::new(
                rng.gen_range(1..=3),
                rng.gen_range(0..10),
                rng.gen_range(0..20),
            );
            let node = component(org, &artifact, kind, version, category);
            ids.push(node.id.clone());
            store.add_node(node)?;
        }
        tiers.push((category, ids));
    }

    let tier = |category: Category| -> Vec<NodeId> {
        tiers
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, ids)| ids.clone())
            .unwrap_or_default()
    };

    for (from, to, max_deps) in WIRING {
        let sources = tier(from);
        for target in tier(to) {
            let wanted = rng.gen_range(1..=max_deps).min(sources.len());
            for source in sources.choose_multiple(rng, wanted) {
                store.add_edge(source, &target)?;
            }
        }
    }

    Ok(DependencyGraph::from_store(store))
}
