//! Atomic layout transactions.
//!
//! Arrangement only ever touches *pending* state and marks nodes dirty.
//! [`Compositor::commit_dirty`](crate::Compositor::commit_dirty) drains the
//! dirty list into a [`Transaction`], configures the affected clients, and
//! waits until each has acknowledged (or a timeout fires) before copying the
//! captured state into *current* in a single pass. Only the head of the
//! queue is ever committed.

mod engine;
mod instruction;

use std::collections::VecDeque;
use std::time::Instant;

pub use instruction::{Instruction, InstructionState, Transaction, TxnId};

use crate::tree::NodeId;

/// Dirty list and transaction queue of a compositor.
#[derive(Debug, Default)]
pub struct TransactionQueue {
    pub(crate) dirty_nodes: Vec<NodeId>,
    pub(crate) queue: VecDeque<Transaction>,
    next_id: u64,
    /// Set while a transaction is being applied. Commits requested meanwhile
    /// leave the dirty list for the next flush.
    pub(crate) applying: bool,
}

impl TransactionQueue {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub(crate) const fn next_id(&mut self) -> TxnId {
        self.next_id += 1;
        TxnId(self.next_id)
    }

    /// Nodes waiting for the next transaction.
    #[must_use]
    pub fn dirty_nodes(&self) -> &[NodeId] { &self.dirty_nodes }

    /// Queued transactions, head first.
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> { self.queue.iter() }

    #[must_use]
    pub fn len(&self) -> usize { self.queue.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.queue.is_empty() }

    #[must_use]
    pub fn head(&self) -> Option<&Transaction> { self.queue.front() }

    pub(crate) fn find_mut(&mut self, id: TxnId) -> Option<&mut Transaction> {
        self.queue.iter_mut().find(|txn| txn.id == id)
    }

    /// Deadline of the committed head transaction, if it is waiting.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.head().filter(|txn| txn.num_waiting > 0).and_then(|txn| txn.deadline)
    }

    /// Whether some later transaction targets exactly the head's nodes.
    pub(crate) fn head_is_superseded(&self) -> bool {
        let Some(head) = self.queue.front() else {
            return false;
        };
        self.queue.iter().skip(1).any(|txn| txn.same_nodes(head))
    }

    pub(crate) fn forget_dirty(&mut self, node: NodeId) { self.dirty_nodes.retain(|&id| id != node); }
}
