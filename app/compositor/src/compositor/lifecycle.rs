//! Output and window lifecycle.
//!
//! These are the entry points a backend calls when displays come and go and
//! when clients map or unmap their toplevels. Each one edits pending state,
//! marks what changed dirty, and re-arranges; the caller's next
//! [`flush`](Compositor::flush) turns that into a transaction.

use super::Compositor;
use crate::events::CoreEvent;
use crate::tree::{NodeId, NodeKind, Output, Rect, SplitLayout, Window};
use crate::view::View;

impl Compositor {
    // ========================================================================
    // Outputs
    // ========================================================================

    /// Connect a display with the given mode size.
    ///
    /// Returns `None` when the configuration disables the output or an
    /// output with the same name is already connected. Windows parked on the
    /// fallback output move to the new one.
    pub fn add_output(&mut self, name: &str, width: f64, height: f64) -> Option<NodeId> {
        if self.output_by_name(name).is_some() {
            tracing::warn!(output = name, "output already connected");
            return None;
        }

        let mut output = Output::new(name, width, height);
        output.layout = self.config.default_layout;
        if let Some(config) = self.config.output(name) {
            if !config.enabled {
                tracing::debug!(output = name, "output disabled by configuration");
                return None;
            }
            output.scale = config.scale;
            output.configured_position = config.x.zip(config.y);
            if let Some(layout) = config.layout {
                output.layout = layout;
            }
        }

        let id = self.create_node(NodeKind::Output(output));
        self.outputs.push(id);
        self.mark_dirty(id);

        let fallback = self.fallback_output;
        let parked = self.nodes.output(fallback).map(|o| o.windows.clone()).unwrap_or_default();
        if !parked.is_empty() {
            tracing::debug!(output = %id, windows = parked.len(), "restoring windows from fallback output");
            for window in parked {
                self.reparent_window(window, id);
            }
            self.mark_dirty(fallback);
        }

        for seat in self.seat_ids() {
            if self.seat_get_focus(seat).is_none() {
                self.seat_set_focus(seat, id);
            }
        }

        tracing::debug!(output = %id, name, width, height, "output added");
        self.arrange_root();
        Some(id)
    }

    /// Disconnect a display, evacuating its windows in order.
    ///
    /// Windows go to the first other enabled output, or to the fallback
    /// output when none is left. The output node is freed once no
    /// transaction references it.
    pub fn disable_output(&mut self, output: NodeId) -> bool {
        if output == self.fallback_output || !self.outputs.contains(&output) {
            return false;
        }
        let Some(windows) = self.nodes.output(output).map(|o| o.windows.clone()) else {
            return false;
        };

        let target =
            self.outputs.iter().copied().find(|&id| id != output).unwrap_or(self.fallback_output);
        for window in windows {
            self.reparent_window(window, target);
        }

        self.outputs.retain(|&id| id != output);
        self.seats_handle_node_destroy(output);

        if let Some(node) = self.nodes.get_mut(output) {
            node.destroying = true;
        }
        if let Some(state) = self.nodes.output_mut(output) {
            state.enabled = false;
            state.active = false;
        }
        self.mark_dirty(output);
        self.mark_dirty(target);

        tracing::debug!(output = %output, target = %target, "output disabled");
        self.events.emit(CoreEvent::NodeDestroying { node: output });
        self.arrange_root();
        true
    }

    /// Update the area left over by exclusive zones, relative to the output
    /// origin.
    pub fn set_usable_area(&mut self, output: NodeId, area: Rect) {
        let Some(state) = self.nodes.output_mut(output) else {
            return;
        };
        if state.reserved_area == Some(area) {
            return;
        }
        state.reserved_area = Some(area);
        self.arrange_output(output);
    }

    pub fn set_output_layout(&mut self, output: NodeId, layout: SplitLayout) {
        let Some(state) = self.nodes.output_mut(output) else {
            return;
        };
        if state.layout == layout {
            return;
        }
        state.layout = layout;
        self.arrange_output(output);
    }

    // ========================================================================
    // Windows
    // ========================================================================

    /// Map a new window on `output`.
    ///
    /// The window is placed right after the default seat's most recently
    /// focused window on that output, tiled, arranged, and focused.
    pub fn map_window(
        &mut self,
        output: NodeId,
        title: impl Into<String>,
        view: Option<Box<dyn View>>,
    ) -> Option<NodeId> {
        if self.nodes.get(output).is_none_or(|node| node.destroying || node.as_output().is_none()) {
            tracing::warn!(output = %output, "cannot map a window on a missing output");
            return None;
        }

        let mut window = Window::new(title, view);
        window.output = Some(output);
        window.border = self.config.border.style;
        window.border_thickness = self.config.border.thickness;
        window.titlebar_height = self.config.border.titlebar_height;
        window.with_view(|view| view.set_tiled(true));

        let sibling = self
            .default_seat()
            .and_then(|seat| self.seat_get_focus_inactive_window(seat, output));

        let id = self.create_node(NodeKind::Window(window));
        let state = self.nodes.output_mut(output)?;
        let index = sibling.and_then(|sibling| state.index_of(sibling)).map_or(state.windows.len(), |i| i + 1);
        state.insert_window(index, id);

        tracing::debug!(window = %id, output = %output, index, "window mapped");
        self.arrange_output(output);
        if let Some(seat) = self.default_seat() {
            self.seat_set_focus(seat, id);
        }
        Some(id)
    }

    /// Unmap a window.
    ///
    /// Seats drop any operation on it and move focus away, then the window
    /// leaves its output and waits in the destroying state until the last
    /// transaction referencing it is torn down.
    pub fn unmap_window(&mut self, window: NodeId) -> bool {
        if self.nodes.get(window).is_none_or(|node| node.destroying || node.as_window().is_none()) {
            return false;
        }

        for seat in self.seat_ids() {
            self.seatop_unref(seat, window);
        }
        self.seats_handle_node_destroy(window);

        let owner = self.nodes.window(window).and_then(|w| w.output);
        if let Some(state) = owner.and_then(|owner| self.nodes.output_mut(owner)) {
            state.remove_window(window);
        }
        if let Some(node) = self.nodes.get_mut(window) {
            node.destroying = true;
        }
        self.mark_dirty(window);
        if let Some(owner) = owner {
            self.arrange_output(owner);
        }

        tracing::debug!(window = %window, "window unmapped");
        self.events.emit(CoreEvent::NodeDestroying { node: window });
        true
    }

    /// Move a window to the end of another output's list.
    pub fn move_window_to_output(&mut self, window: NodeId, output: NodeId) -> bool {
        let Some(from) = self.nodes.window(window).and_then(|w| w.output) else {
            return false;
        };
        if from == output
            || self.nodes.get(output).is_none_or(|node| node.destroying || node.as_output().is_none())
        {
            return false;
        }

        self.reparent_window(window, output);
        self.mark_dirty(from);
        self.mark_dirty(output);
        self.arrange_output(from);
        self.arrange_output(output);
        true
    }

    /// Ask a window's client to close it.
    pub fn close_window(&mut self, window: NodeId) -> bool {
        let Some(state) = self.nodes.window_mut(window) else {
            return false;
        };
        if state.view.is_none() {
            return false;
        }
        state.with_view(|view| view.close());
        true
    }

    /// Detach a window from its output and append it to `target`.
    fn reparent_window(&mut self, window: NodeId, target: NodeId) {
        let Some(state) = self.nodes.window_mut(window) else {
            return;
        };
        let from = state.output.replace(target);
        state.reset_fractions();

        if let Some(from) = from.and_then(|from| self.nodes.output_mut(from)) {
            from.remove_window(window);
        }
        if let Some(to) = self.nodes.output_mut(target) {
            let end = to.windows.len();
            to.insert_window(end, window);
        }
        self.mark_dirty(window);
    }
}
