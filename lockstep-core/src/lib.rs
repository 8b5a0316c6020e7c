//! Lockstep Core
//!
//! This crate tracks a directed graph of versioned software components and
//! decides, for any component, whether it is drifted: built against
//! dependency versions that are no longer current, directly or transitively.
//! It implements:
//!
//! - The graph model with derived upstream/downstream indices
//! - A lock table recording what each consumer was last built against
//! - Memoized drift detection with a detailed outlier report
//! - Reachability used to highlight related components
//! - Atomic commands: add, remove, wire, bump, rebuild, edit dependencies
//! - A validated session codec (JSON and MessagePack)
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `version`: Semantic version value type and bump rules
//! - `graph`: Nodes, edges, lock table, and the store that owns them
//! - `drift`: Direct and transitive drift queries
//! - `reach`: Breadth-first traversals over the adjacency index
//! - `session`: Session document encoding and validation
//! - `engine`: The owned façade and a thread-safe shared handle
//! - `seed`: A fixed sample graph and a random layered graph
//!
//! # Example
//!
//! ```rust
//! use lockstep_core::{BumpKind, Category, DependencyGraph, Node, Version};
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node(Node::new("a", Version::new(1, 0, 0), Category::Foundation))?;
//! graph.add_node(Node::new("b", Version::new(1, 0, 0), Category::Readers))?;
//! graph.add_edge("a", "b")?;
//!
//! // Publishing a new version of `a` leaves `b` built against the old one
//! graph.bump_and_publish("a", BumpKind::Patch, None, None)?;
//! assert!(graph.is_outdated("b"));
//!
//! // Rebuilding `b` relocks it and issues a patch release of its own
//! graph.rebuild("b")?;
//! assert!(!graph.is_outdated("b"));
//! # Ok::<(), lockstep_core::Error>(())
//! ```

pub mod drift;
pub mod engine;
pub mod error;
pub mod graph;
pub mod reach;
pub mod seed;
pub mod session;
pub mod version;

pub use drift::{DriftEngine, DriftReport, Outlier};
pub use engine::{DependencyGraph, NodeDraft, SharedGraph};
pub use error::{Error, Result};
pub use graph::{Category, Edge, GraphStore, LockTable, Node, NodeId, NodeKind, Release};
pub use reach::UpstreamClosure;
pub use session::{SessionDocument, SessionLimits};
pub use version::{BumpKind, Version};
