//! Node arena.
//!
//! Nodes are addressed by [`NodeId`]. Ids are handed out from a monotonic
//! counter and never reused, so a stale id simply fails lookup instead of
//! aliasing a newer node.

use std::collections::HashMap;

use super::node::{Node, NodeId, NodeKind};
use super::output::Output;
use super::window::Window;

/// Owner of every live node.
#[derive(Debug)]
pub struct NodeStore {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
}

impl Default for NodeStore {
    fn default() -> Self { Self::new() }
}

impl NodeStore {
    #[must_use]
    pub fn new() -> Self { Self { nodes: HashMap::new(), next_id: 1 } }

    /// Insert a node and return its id.
    pub fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id, kind));
        id
    }

    /// Remove a node from the arena.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> { self.nodes.remove(&id) }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> { self.nodes.get(&id) }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> { self.nodes.get_mut(&id) }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool { self.nodes.contains_key(&id) }

    #[must_use]
    pub fn len(&self) -> usize { self.nodes.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    #[must_use]
    pub fn window(&self, id: NodeId) -> Option<&Window> { self.get(id)?.as_window() }

    pub fn window_mut(&mut self, id: NodeId) -> Option<&mut Window> {
        self.get_mut(id)?.as_window_mut()
    }

    #[must_use]
    pub fn output(&self, id: NodeId) -> Option<&Output> { self.get(id)?.as_output() }

    pub fn output_mut(&mut self, id: NodeId) -> Option<&mut Output> {
        self.get_mut(id)?.as_output_mut()
    }

    /// Ids of every live window, in ascending order.
    #[must_use]
    pub fn window_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> =
            self.nodes.values().filter(|node| node.as_window().is_some()).map(|node| node.id).collect();
        ids.sort_unstable();
        ids
    }

    /// The parent of a node.
    ///
    /// A window's parent is its pending output. An output is its own parent,
    /// which terminates ancestor walks. Unparented windows have none.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        match &node.kind {
            NodeKind::Window(window) => window.output,
            NodeKind::Output(_) => Some(id),
        }
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    #[must_use]
    pub fn has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if parent == current {
                return false;
            }
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }
}
