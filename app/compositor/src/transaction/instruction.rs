//! Transactions and their per-node instructions.

use std::time::Instant;

use serde::Serialize;

use crate::tree::{NodeId, OutputState, WindowState};

/// Transaction identifier. Monotonic within one compositor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TxnId(pub u64);

impl std::fmt::Display for TxnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

/// State captured for one node.
#[derive(Clone, Debug, PartialEq)]
pub enum InstructionState {
    Output(OutputState),
    Window(WindowState),
}

/// One node's captured target state.
#[derive(Clone, Debug)]
pub struct Instruction {
    pub node: NodeId,
    pub state: InstructionState,
    /// Configure serial sent to the view, when a configure produced one.
    pub serial: Option<u32>,
    /// Whether the change was requested by the compositor rather than the
    /// client.
    pub server_request: bool,
    /// Whether the transaction is still waiting on this instruction.
    pub waiting: bool,
    /// Time this instruction became ready, for timing reports.
    pub ready_at: Option<Instant>,
}

impl Instruction {
    #[must_use]
    pub const fn new(node: NodeId, state: InstructionState, server_request: bool) -> Self {
        Self { node, state, serial: None, server_request, waiting: false, ready_at: None }
    }

    /// The captured window state, if this instruction targets a window.
    #[must_use]
    pub const fn window_state(&self) -> Option<&WindowState> {
        match &self.state {
            InstructionState::Window(state) => Some(state),
            InstructionState::Output(_) => None,
        }
    }
}

/// A batch of node snapshots applied atomically.
///
/// A transaction is *building* until [`Transaction::commit_time`] is set,
/// *waiting* while `num_waiting > 0`, and *ready* afterwards.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub id: TxnId,
    pub instructions: Vec<Instruction>,
    /// Instructions still awaiting a client acknowledgement.
    pub num_waiting: usize,
    /// Configures sent at commit time.
    pub num_configures: usize,
    /// Deadline after which the transaction applies regardless of clients.
    pub deadline: Option<Instant>,
    pub commit_time: Option<Instant>,
    pub create_time: Instant,
}

impl Transaction {
    #[must_use]
    pub const fn new(id: TxnId, create_time: Instant) -> Self {
        Self {
            id,
            instructions: Vec::new(),
            num_waiting: 0,
            num_configures: 0,
            deadline: None,
            commit_time: None,
            create_time,
        }
    }

    #[must_use]
    pub const fn is_committed(&self) -> bool { self.commit_time.is_some() }

    /// Whether the transaction is committed and no longer waiting.
    #[must_use]
    pub const fn is_ready(&self) -> bool { self.is_committed() && self.num_waiting == 0 }

    /// Index of the instruction targeting `node`.
    #[must_use]
    pub fn instruction_index(&self, node: NodeId) -> Option<usize> {
        self.instructions.iter().position(|instruction| instruction.node == node)
    }

    /// Whether both transactions target the same nodes in the same order.
    #[must_use]
    pub fn same_nodes(&self, other: &Self) -> bool {
        self.instructions.len() == other.instructions.len()
            && self.instructions.iter().zip(&other.instructions).all(|(a, b)| a.node == b.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn_with(id: u64, nodes: &[u64]) -> Transaction {
        let mut txn = Transaction::new(TxnId(id), Instant::now());
        for &node in nodes {
            txn.instructions.push(Instruction::new(
                NodeId(node),
                InstructionState::Window(WindowState::default()),
                true,
            ));
        }
        txn
    }

    #[test]
    fn test_same_nodes_requires_same_order() {
        let a = txn_with(1, &[1, 2, 3]);
        assert!(a.same_nodes(&txn_with(2, &[1, 2, 3])));
        assert!(!a.same_nodes(&txn_with(3, &[1, 3, 2])));
        assert!(!a.same_nodes(&txn_with(4, &[1, 2])));
    }

    #[test]
    fn test_readiness_requires_commit() {
        let mut txn = txn_with(1, &[1]);
        assert!(!txn.is_ready());

        txn.commit_time = Some(Instant::now());
        assert!(txn.is_ready());

        txn.num_waiting = 1;
        assert!(!txn.is_ready());
    }

    #[test]
    fn test_instruction_index() {
        let txn = txn_with(1, &[5, 7]);
        assert_eq!(txn.instruction_index(NodeId(7)), Some(1));
        assert_eq!(txn.instruction_index(NodeId(9)), None);
    }
}
