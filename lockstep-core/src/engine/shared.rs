//! Shared Graph Handle
//!
//! For hosts that serve several callers at once. One writer lock guards the
//! whole state, so every read closure observes exactly one committed
//! snapshot and drift memoization stays valid for its duration.

use std::sync::Arc;

use parking_lot::RwLock;

use super::DependencyGraph;
use crate::graph::GraphStore;

/// Cheaply clonable, thread-safe handle to a [`DependencyGraph`].
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<DependencyGraph>>,
}

impl SharedGraph {
    pub fn new(graph: DependencyGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// Run a query under the read lock.
    pub fn read<R>(&self, query: impl FnOnce(&DependencyGraph) -> R) -> R {
        query(&self.inner.read())
    }

    /// Run a command under the write lock.
    pub fn write<R>(&self, command: impl FnOnce(&mut DependencyGraph) -> R) -> R {
        command(&mut self.inner.write())
    }

    /// The committed snapshot, detached from the lock.
    pub fn snapshot(&self) -> Arc<GraphStore> {
        self.inner.read().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Category, Node};
    use crate::version::{BumpKind, Version};
    use std::thread;

    #[test]
    fn writers_and_readers_share_state() {
        let shared = SharedGraph::new(DependencyGraph::new());
        shared
            .write(|g| {
                g.add_node(Node::new("a", Version::initial(), Category::Foundation))?;
                g.add_node(Node::new("b", Version::initial(), Category::Readers))?;
                g.add_edge("a", "b")
            })
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared
                        .write(|g| g.bump_and_publish("a", BumpKind::Patch, None, None))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            shared.read(|g| g.get_node("a").map(|n| n.version)),
            Some(Version::new(1, 0, 4))
        );
        assert!(shared.read(|g| g.is_outdated("b")));
    }

    #[test]
    fn detached_snapshot_is_stable() {
        let shared = SharedGraph::default();
        shared
            .write(|g| g.add_node(Node::new("a", Version::initial(), Category::Foundation)))
            .unwrap();

        let before = shared.snapshot();
        shared
            .write(|g| g.bump_and_publish("a", BumpKind::Major, None, None))
            .unwrap();

        assert_eq!(before.current_version("a"), Some(Version::initial()));
        assert_eq!(shared.snapshot().current_version("a"), Some(Version::new(2, 0, 0)));
    }
}
