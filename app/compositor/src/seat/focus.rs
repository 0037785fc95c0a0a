//! Seat focus stacks.
//!
//! Each seat keeps every focusable node in recency order. The head of the
//! stack is the focused node; "focus-inactive" lookups find the most recent
//! node inside some subtree.

use super::SeatId;
use crate::compositor::Compositor;
use crate::events::CoreEvent;
use crate::tree::{NodeId, NodeType};

impl Compositor {
    /// The node focused by a seat.
    #[must_use]
    pub fn seat_get_focus(&self, seat: SeatId) -> Option<NodeId> {
        let seat = self.seat(seat)?;
        seat.focus_stack()
            .iter()
            .copied()
            .find(|&id| self.nodes.get(id).is_some_and(|node| !node.destroying))
    }

    /// The most recently focused node that is `node` or inside it.
    #[must_use]
    pub fn seat_get_focus_inactive(&self, seat: SeatId, node: NodeId) -> Option<NodeId> {
        let seat = self.seat(seat)?;
        seat.focus_stack().iter().copied().find(|&id| {
            self.nodes.get(id).is_some_and(|n| !n.destroying)
                && (id == node || self.nodes.has_ancestor(id, node))
        })
    }

    /// The most recently focused window inside `node`.
    #[must_use]
    pub fn seat_get_focus_inactive_window(&self, seat: SeatId, node: NodeId) -> Option<NodeId> {
        let seat = self.seat(seat)?;
        seat.focus_stack().iter().copied().find(|&id| {
            self.nodes.get(id).is_some_and(|n| !n.destroying && n.node_type() == NodeType::Window)
                && (id == node || self.nodes.has_ancestor(id, node))
        })
    }

    /// Move a node to the head of a seat's stack without activation side
    /// effects.
    pub fn seat_set_raw_focus(&mut self, seat: SeatId, node: NodeId) {
        if !self.nodes.contains(node) {
            return;
        }
        let Some(seat) = self.seat_mut(seat) else {
            return;
        };
        seat.move_to_front(node);

        self.mark_dirty(node);
        if let Some(parent) = self.nodes.parent(node) {
            self.mark_dirty(parent);
        }
    }

    /// Give keyboard focus to a node.
    ///
    /// The node's output is raw-focused first so it ends up right behind the
    /// node. The previous focus is deactivated and a focused window is
    /// activated.
    pub fn seat_set_focus(&mut self, seat: SeatId, node: NodeId) {
        let previous = self.seat_get_focus(seat);
        self.set_focus_from(seat, node, previous);
    }

    fn set_focus_from(&mut self, seat: SeatId, node: NodeId, previous: Option<NodeId>) {
        if previous == Some(node) {
            return;
        }
        let Some(target) = self.nodes.get(node) else {
            return;
        };
        if target.destroying {
            tracing::debug!(node = %node, "refusing to focus a destroying node");
            return;
        }

        if let Some(output) = self.nodes.parent(node).filter(|&output| output != node) {
            self.seat_set_raw_focus(seat, output);
        }
        self.seat_set_raw_focus(seat, node);

        if let Some(previous) = previous {
            self.deactivate(previous);
        }
        if self.nodes.window(node).is_some() {
            self.set_window_activated(node, true);
        }
        self.update_active_outputs();

        tracing::debug!(seat = %seat, ?previous, focus = %node, "focus changed");
        self.events.emit(CoreEvent::SeatFocusChanged { seat, previous, focus: Some(node) });
    }

    fn deactivate(&mut self, node: NodeId) {
        if self.nodes.window(node).is_some() {
            self.set_window_activated(node, false);
            return;
        }
        let windows = self.nodes.output(node).map(|output| output.windows.clone()).unwrap_or_default();
        for window in windows {
            self.set_window_activated(window, false);
        }
    }

    fn set_window_activated(&mut self, id: NodeId, activated: bool) {
        let Some(window) = self.nodes.window_mut(id) else {
            return;
        };
        window.with_view(|view| view.set_activated(activated));
        if window.focused != activated {
            window.focused = activated;
            self.mark_dirty(id);
        }
    }

    /// Recompute which outputs hold some seat's focus.
    fn update_active_outputs(&mut self) {
        let focused_outputs: Vec<NodeId> = self
            .seat_ids()
            .into_iter()
            .filter_map(|seat| self.seat_get_focus(seat))
            .filter_map(|focus| self.nodes.parent(focus))
            .collect();

        for output in self.outputs.clone() {
            let active = focused_outputs.contains(&output);
            let Some(state) = self.nodes.output_mut(output) else {
                continue;
            };
            if state.active != active {
                state.active = active;
                self.mark_dirty(output);
            }
        }
    }

    /// Remove a node that is being destroyed from every focus stack.
    ///
    /// A seat that focused the node (or something inside it) moves focus to
    /// the most recent window of the node's output, or the output itself
    /// when it has no other window.
    /// Other seats promote that window right behind their current focus.
    pub(crate) fn seats_handle_node_destroy(&mut self, node: NodeId) {
        let parent = self.nodes.parent(node).filter(|&parent| parent != node);

        for seat in self.seat_ids() {
            let focus = self.seat_get_focus(seat);
            let was_focused =
                focus.is_some_and(|focus| focus == node || self.nodes.has_ancestor(focus, node));

            if let Some(state) = self.seat_mut(seat) {
                state.forget(node);
            }

            let container = parent.or_else(|| self.outputs.iter().copied().find(|&output| output != node));
            let next = container
                .map(|container| self.seat_get_focus_inactive_window(seat, container).unwrap_or(container));
            let Some(next) = next else {
                continue;
            };

            if was_focused {
                self.set_focus_from(seat, next, None);
            } else if let Some(focus) = self.seat_get_focus(seat) {
                // Keep the current focus but make `next` the runner-up.
                self.seat_set_raw_focus(seat, next);
                self.seat_set_raw_focus(seat, focus);
            }
        }
    }
}
