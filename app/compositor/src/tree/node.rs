//! Node identity and lifecycle.
//!
//! Every object that can take part in a transaction is a [`Node`]: a stable
//! id, the output or window payload, and the bookkeeping the transaction
//! engine needs (dirty flag, in-flight instruction, reference count).

use serde::{Deserialize, Serialize};

use super::output::Output;
use super::window::Window;
use crate::transaction::TxnId;

/// Unique node identifier. Ids are monotonic and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminant of a node's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    Output,
    Window,
}

/// A node's payload.
#[derive(Debug)]
pub enum NodeKind {
    Output(Output),
    Window(Window),
}

impl NodeKind {
    /// The payload discriminant.
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        match self {
            Self::Output(_) => NodeType::Output,
            Self::Window(_) => NodeType::Window,
        }
    }
}

/// Location of a node's in-flight instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstructionRef {
    pub txn: TxnId,
    pub index: usize,
}

/// A node in the arena.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// The instruction of the committed or building transaction that
    /// targets this node.
    pub instruction: Option<InstructionRef>,
    /// Number of queued transactions holding an instruction for this node.
    pub txn_ref_count: u32,
    /// Set once the node is removed from the tree; it is freed when no
    /// transaction references it any more.
    pub destroying: bool,
    /// Whether the node is queued for the next transaction.
    pub dirty: bool,
}

impl Node {
    pub(crate) const fn new(id: NodeId, kind: NodeKind) -> Self {
        Self { id, kind, instruction: None, txn_ref_count: 0, destroying: false, dirty: false }
    }

    #[must_use]
    pub const fn node_type(&self) -> NodeType { self.kind.node_type() }

    /// Whether the node may be freed now.
    #[must_use]
    pub const fn is_freeable(&self) -> bool { self.destroying && self.txn_ref_count == 0 }

    #[must_use]
    pub const fn as_window(&self) -> Option<&Window> {
        match &self.kind {
            NodeKind::Window(window) => Some(window),
            NodeKind::Output(_) => None,
        }
    }

    pub const fn as_window_mut(&mut self) -> Option<&mut Window> {
        match &mut self.kind {
            NodeKind::Window(window) => Some(window),
            NodeKind::Output(_) => None,
        }
    }

    #[must_use]
    pub const fn as_output(&self) -> Option<&Output> {
        match &self.kind {
            NodeKind::Output(output) => Some(output),
            NodeKind::Window(_) => None,
        }
    }

    pub const fn as_output_mut(&mut self) -> Option<&mut Output> {
        match &mut self.kind {
            NodeKind::Output(output) => Some(output),
            NodeKind::Window(_) => None,
        }
    }
}
