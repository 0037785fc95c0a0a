//! The compositor context.
//!
//! [`Compositor`] owns the node arena, the transaction queue, the seats, and
//! the collaborators the core reports to (damage sink, event bus, clock).
//! Every operation of the core is a method on it; there is no global state.

mod hit_test;
mod lifecycle;
mod snapshot;

use tokio::sync::mpsc;

pub use hit_test::HitTarget;
pub use snapshot::{LayoutSnapshot, OutputRow, WindowRow};

use crate::clock::{Clock, SystemClock};
use crate::config::LatticeConfig;
use crate::constants::names;
use crate::damage::{DamageSink, NullDamage};
use crate::events::{CoreEvent, EventBus};
use crate::seat::{Seat, SeatId};
use crate::transaction::TransactionQueue;
use crate::tree::{NodeId, NodeKind, NodeStore, Output, Window};

/// Layout, transaction, and seat state of one compositor instance.
pub struct Compositor {
    pub(crate) config: LatticeConfig,
    pub(crate) nodes: NodeStore,
    pub(crate) txns: TransactionQueue,
    /// Enabled outputs in layout order.
    pub(crate) outputs: Vec<NodeId>,
    pub(crate) fallback_output: NodeId,
    pub(crate) seats: Vec<Seat>,
    next_seat_id: u32,
    pub(crate) damage: Box<dyn DamageSink>,
    pub(crate) events: EventBus,
    pub(crate) clock: Box<dyn Clock>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("nodes", &self.nodes.len())
            .field("outputs", &self.outputs)
            .field("seats", &self.seats.len())
            .field("queued_transactions", &self.txns.len())
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Create a compositor that discards damage and uses the system clock.
    #[must_use]
    pub fn new(config: LatticeConfig) -> Self {
        Self::with_backends(config, Box::new(NullDamage), Box::new(SystemClock))
    }

    /// Create a compositor with explicit damage and clock backends.
    #[must_use]
    pub fn with_backends(
        config: LatticeConfig,
        damage: Box<dyn DamageSink>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let mut nodes = NodeStore::new();
        let fallback_output =
            nodes.insert(NodeKind::Output(Output::fallback(names::FALLBACK_OUTPUT)));

        let mut compositor = Self {
            config,
            nodes,
            txns: TransactionQueue::new(),
            outputs: Vec::new(),
            fallback_output,
            seats: Vec::new(),
            next_seat_id: 0,
            damage,
            events: EventBus::new(),
            clock,
        };
        compositor.add_seat(names::DEFAULT_SEAT);
        compositor
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub const fn config(&self) -> &LatticeConfig { &self.config }

    #[must_use]
    pub const fn nodes(&self) -> &NodeStore { &self.nodes }

    #[must_use]
    pub const fn transactions(&self) -> &TransactionQueue { &self.txns }

    /// Enabled outputs in layout order.
    #[must_use]
    pub fn outputs(&self) -> &[NodeId] { &self.outputs }

    /// The disabled output that receives windows of removed displays.
    #[must_use]
    pub const fn fallback_output(&self) -> NodeId { self.fallback_output }

    #[must_use]
    pub fn window(&self, id: NodeId) -> Option<&Window> { self.nodes.window(id) }

    #[must_use]
    pub fn output(&self, id: NodeId) -> Option<&Output> { self.nodes.output(id) }

    /// Find an enabled output by name.
    #[must_use]
    pub fn output_by_name(&self, name: &str) -> Option<NodeId> {
        self.outputs
            .iter()
            .copied()
            .find(|&id| self.nodes.output(id).is_some_and(|output| output.name == name))
    }

    /// Find a live window by title.
    #[must_use]
    pub fn window_by_title(&self, title: &str) -> Option<NodeId> {
        self.nodes.window_ids().into_iter().find(|&id| {
            self.nodes.get(id).is_some_and(|node| {
                !node.destroying && node.as_window().is_some_and(|window| window.title == title)
            })
        })
    }

    /// Register a subscriber for core events.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<CoreEvent> { self.events.subscribe() }

    /// Number of core events emitted so far.
    #[must_use]
    pub const fn events_emitted(&self) -> u64 { self.events.emitted() }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Insert a node, append it to every seat's focus stack, and announce it.
    pub(crate) fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let node_type = kind.node_type();
        let id = self.nodes.insert(kind);
        for seat in &mut self.seats {
            seat.append_focus(id);
        }
        tracing::debug!(node = %id, ?node_type, "node created");
        self.events.emit(CoreEvent::NodeCreated { node: id, node_type });
        id
    }

    /// Queue a node for the next transaction. Idempotent.
    pub fn mark_dirty(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.dirty {
            return;
        }
        node.dirty = true;
        self.txns.dirty_nodes.push(id);
    }

    /// The parent of a node. Outputs are their own parent.
    #[must_use]
    pub fn node_parent(&self, id: NodeId) -> Option<NodeId> { self.nodes.parent(id) }

    /// Whether `ancestor` appears on the parent chain of `id`.
    #[must_use]
    pub fn node_has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.nodes.has_ancestor(id, ancestor)
    }

    // ========================================================================
    // Seats
    // ========================================================================

    /// Create a seat. Its focus stack starts with every live node.
    pub fn add_seat(&mut self, name: impl Into<String>) -> SeatId {
        let id = SeatId(self.next_seat_id);
        self.next_seat_id += 1;

        let mut seat = Seat::new(id, name);
        for &output in &self.outputs {
            seat.append_focus(output);
            if let Some(windows) = self.nodes.output(output).map(|o| o.windows.clone()) {
                for window in windows {
                    seat.append_focus(window);
                }
            }
        }
        tracing::debug!(seat = %id, name = %seat.name, "seat created");
        self.seats.push(seat);
        id
    }

    /// Destroy a seat after ending its seatop.
    pub fn remove_seat(&mut self, id: SeatId) -> bool {
        if self.seat(id).is_none() {
            return false;
        }
        self.seatop_end(id);
        self.seats.retain(|seat| seat.id != id);
        tracing::debug!(seat = %id, "seat destroyed");
        true
    }

    #[must_use]
    pub fn seat(&self, id: SeatId) -> Option<&Seat> { self.seats.iter().find(|seat| seat.id == id) }

    pub(crate) fn seat_mut(&mut self, id: SeatId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|seat| seat.id == id)
    }

    /// Find a seat by name.
    #[must_use]
    pub fn seat_by_name(&self, name: &str) -> Option<SeatId> {
        self.seats.iter().find(|seat| seat.name == name).map(|seat| seat.id)
    }

    /// Ids of every seat, in creation order.
    #[must_use]
    pub fn seat_ids(&self) -> Vec<SeatId> { self.seats.iter().map(|seat| seat.id).collect() }

    /// The seat created at startup.
    #[must_use]
    pub fn default_seat(&self) -> Option<SeatId> { self.seats.first().map(|seat| seat.id) }

    // ========================================================================
    // Event loop integration
    // ========================================================================

    /// End-of-batch hook: fire expired timers and commit dirty nodes.
    pub fn flush(&mut self) {
        self.handle_timeouts();
        self.commit_dirty();
    }

    /// Whether every queued transaction has been applied.
    #[must_use]
    pub fn is_idle(&self) -> bool { self.txns.is_empty() && self.txns.dirty_nodes.is_empty() }
}
