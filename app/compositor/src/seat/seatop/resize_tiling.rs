//! Resize-tiling seatop: interactive drag resize of tiled windows.
//!
//! The horizontal and vertical components of the grabbed edge are handled
//! independently, each with its own resize parent and sibling.

use super::Seatop;
use crate::compositor::Compositor;
use crate::seat::SeatId;
use crate::tree::{Axis, Edges, NodeId, ResizeTarget};

/// Data of the resize-tiling state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeTilingState {
    /// The window the drag started on.
    pub window: NodeId,
    pub edge: Edges,
    /// Cursor position when the drag started.
    pub ref_lx: f64,
    pub ref_ly: f64,
    pub h_container: Option<NodeId>,
    pub h_sibling: Option<NodeId>,
    pub h_orig_width: f64,
    pub v_container: Option<NodeId>,
    pub v_sibling: Option<NodeId>,
    pub v_orig_height: f64,
}

impl ResizeTilingState {
    /// Whether `window` takes part in this resize.
    #[must_use]
    pub fn involves(&self, window: NodeId) -> bool {
        self.window == window
            || self.h_container == Some(window)
            || self.h_sibling == Some(window)
            || self.v_container == Some(window)
            || self.v_sibling == Some(window)
    }

    fn participants(&self) -> impl Iterator<Item = NodeId> {
        [self.h_container, self.h_sibling, self.v_container, self.v_sibling].into_iter().flatten()
    }
}

impl Compositor {
    /// Start dragging `edge` of `window`.
    pub fn seatop_begin_resize_tiling(&mut self, seat: SeatId, window: NodeId, edge: Edges) {
        let Some((ref_lx, ref_ly)) = self.seat(seat).map(|s| (s.cursor.x, s.cursor.y)) else {
            return;
        };
        let mut data = ResizeTilingState {
            window,
            edge,
            ref_lx,
            ref_ly,
            h_container: None,
            h_sibling: None,
            h_orig_width: 0.0,
            v_container: None,
            v_sibling: None,
            v_orig_height: 0.0,
        };

        let horizontal = edge.horizontal();
        if !horizontal.is_empty()
            && let Some(container) = self.find_resize_parent(window, ResizeTarget::Edge(horizontal))
            && let Some(sibling) = self.resize_sibling(container, horizontal)
        {
            data.h_container = Some(container);
            data.h_sibling = Some(sibling);
            data.h_orig_width = self.nodes.window(container).map_or(0.0, |w| w.width);
        }

        let vertical = edge.vertical();
        if !vertical.is_empty()
            && let Some(container) = self.find_resize_parent(window, ResizeTarget::Edge(vertical))
            && let Some(sibling) = self.resize_sibling(container, vertical)
        {
            data.v_container = Some(container);
            data.v_sibling = Some(sibling);
            data.v_orig_height = self.nodes.window(container).map_or(0.0, |w| w.height);
        }

        for participant in data.participants().collect::<Vec<_>>() {
            self.set_window_resizing(participant, true);
        }

        tracing::debug!(seat = %seat, window = %window, ?edge, "begin tiling resize");
        self.set_seatop(seat, Seatop::ResizeTiling(data));
        self.commit_dirty();
        self.clear_pointer_focus(seat);
    }

    pub(super) fn resize_tiling_pointer_motion(&mut self, seat: SeatId, data: ResizeTilingState) {
        let Some((cx, cy)) = self.seat(seat).map(|s| (s.cursor.x, s.cursor.y)) else {
            return;
        };
        let moved_x = cx - data.ref_lx;
        let moved_y = cy - data.ref_ly;

        let amount_x = data.h_container.map_or(0, |container| {
            let orig = data.h_orig_width;
            let target = if data.edge.contains(Edges::LEFT) { orig - moved_x } else { orig + moved_x };
            self.pixel_delta(target, container, Axis::Horizontal)
        });
        let amount_y = data.v_container.map_or(0, |container| {
            let orig = data.v_orig_height;
            let target = if data.edge.contains(Edges::TOP) { orig - moved_y } else { orig + moved_y };
            self.pixel_delta(target, container, Axis::Vertical)
        });

        if let Some(container) = data.h_container.filter(|_| amount_x != 0) {
            self.resize_tiled(container, ResizeTarget::Edge(data.edge.horizontal()), amount_x);
        }
        if let Some(container) = data.v_container.filter(|_| amount_y != 0) {
            self.resize_tiled(container, ResizeTarget::Edge(data.edge.vertical()), amount_y);
        }
        self.commit_dirty();
    }

    /// Whole pixels between a target extent and a window's pending extent.
    fn pixel_delta(&self, target: f64, window: NodeId, axis: Axis) -> i32 {
        let current = self.nodes.window(window).map_or(0.0, |w| w.extent(axis));
        #[allow(clippy::cast_possible_truncation)]
        let delta = (target - current).trunc() as i32;
        delta
    }

    pub(super) fn resize_tiling_pointer_button(&mut self, seat: SeatId, data: ResizeTilingState) {
        if self.seat(seat).is_none_or(|s| s.cursor.pressed_count() > 0) {
            return;
        }
        self.clear_resizing(&data, None);
        for container in [data.h_container, data.v_container].into_iter().flatten() {
            self.arrange_parent_of(container);
        }
        self.commit_dirty();
        tracing::debug!(seat = %seat, "end tiling resize");
        self.seatop_begin_default(seat);
    }

    /// Clear the resizing flag of every participant except `skip`.
    pub(super) fn clear_resizing(&mut self, data: &ResizeTilingState, skip: Option<NodeId>) {
        for participant in data.participants().collect::<Vec<_>>() {
            if Some(participant) != skip {
                self.set_window_resizing(participant, false);
            }
        }
    }

    fn set_window_resizing(&mut self, id: NodeId, resizing: bool) {
        let Some(window) = self.nodes.window_mut(id) else {
            return;
        };
        window.resizing = resizing;
        window.with_view(|view| view.set_resizing(resizing));
    }
}
