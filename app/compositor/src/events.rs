//! Core events.
//!
//! Everything the core wants the outside world to know about (node
//! lifecycle, applied transactions, focus and pointer routing) is published
//! as a [`CoreEvent`] to every subscriber.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::seat::SeatId;
use crate::transaction::TxnId;
use crate::tree::{Axis, NodeId, NodeType};

/// An event emitted by the compositor core.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CoreEvent {
    NodeCreated { node: NodeId, node_type: NodeType },
    NodeDestroying { node: NodeId },
    NodeFreed { node: NodeId },
    TransactionApplied { txn: TxnId, nodes: usize, waited_ms: u64 },
    SeatFocusChanged { seat: SeatId, previous: Option<NodeId>, focus: Option<NodeId> },
    /// Pointer entered a window surface at surface-local coordinates.
    PointerEnter { seat: SeatId, window: NodeId, sx: f64, sy: f64 },
    PointerMotion { seat: SeatId, window: NodeId, sx: f64, sy: f64 },
    PointerButton { seat: SeatId, window: Option<NodeId>, button: u32, pressed: bool },
    PointerAxis { seat: SeatId, window: NodeId, axis: Axis, delta: f64 },
    /// Pointer focus was cleared (decorations, empty space, or a grab).
    PointerCleared { seat: SeatId },
    OutputEnter { window: NodeId, output: NodeId },
    OutputLeave { window: NodeId, output: NodeId },
}

impl CoreEvent {
    /// Returns the event name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NodeCreated { .. } => "NodeCreated",
            Self::NodeDestroying { .. } => "NodeDestroying",
            Self::NodeFreed { .. } => "NodeFreed",
            Self::TransactionApplied { .. } => "TransactionApplied",
            Self::SeatFocusChanged { .. } => "SeatFocusChanged",
            Self::PointerEnter { .. } => "PointerEnter",
            Self::PointerMotion { .. } => "PointerMotion",
            Self::PointerButton { .. } => "PointerButton",
            Self::PointerAxis { .. } => "PointerAxis",
            Self::PointerCleared { .. } => "PointerCleared",
            Self::OutputEnter { .. } => "OutputEnter",
            Self::OutputLeave { .. } => "OutputLeave",
        }
    }
}

/// Fan-out of core events to unbounded subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<CoreEvent>>,
    emitted: u64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<CoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Publish an event. Subscribers whose receiver was dropped are removed.
    pub fn emit(&mut self, event: CoreEvent) {
        tracing::trace!(event = event.name(), "core event");
        self.emitted += 1;
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Total number of events emitted.
    #[must_use]
    pub const fn emitted(&self) -> u64 { self.emitted }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_every_subscriber() {
        let mut bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.emit(CoreEvent::NodeFreed { node: NodeId(4) });

        assert_eq!(a.try_recv().ok(), Some(CoreEvent::NodeFreed { node: NodeId(4) }));
        assert_eq!(b.try_recv().ok(), Some(CoreEvent::NodeFreed { node: NodeId(4) }));
        assert_eq!(bus.emitted(), 1);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut bus = EventBus::new();
        let rx = bus.subscribe();
        drop(rx);

        bus.emit(CoreEvent::NodeDestroying { node: NodeId(1) });

        assert!(bus.subscribers.is_empty());
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = CoreEvent::OutputEnter { window: NodeId(2), output: NodeId(1) };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"outputEnter","window":2,"output":1}"#);
    }
}
