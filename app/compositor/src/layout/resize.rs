//! Tiled resizing.
//!
//! A resize moves space between a window and its neighbours along the
//! output's layout axis by adjusting split fractions, then re-arranges the
//! output. Resizes that would push any participant below its minimum size
//! are silently dropped.

use crate::compositor::Compositor;
use crate::constants::sizes::{MIN_SANE_H, MIN_SANE_W};
use crate::tree::{Axis, Edges, NodeId, ResizeTarget, WindowList};

impl Compositor {
    /// The output and window list a window is tiled in, with its index.
    fn siblings(&self, window: NodeId) -> Option<(NodeId, WindowList, usize)> {
        let output_id = self.nodes.window(window)?.output?;
        let output = self.nodes.output(output_id)?;
        let index = output.index_of(window)?;
        Some((output_id, output.windows.clone(), index))
    }

    /// Smallest extent a window accepts along an axis.
    fn min_extent(&self, window: NodeId, axis: Axis) -> f64 {
        let constraints =
            self.nodes.window(window).and_then(|w| w.view.as_deref()).map(|view| view.constraints());
        match axis {
            Axis::Horizontal => constraints.map_or(MIN_SANE_W, |c| c.min_width.max(MIN_SANE_W)),
            Axis::Vertical => constraints.map_or(MIN_SANE_H, |c| c.min_height.max(MIN_SANE_H)),
        }
    }

    /// The nearest node that can be resized towards `target`.
    ///
    /// The node's parent must split along the target axis, the node must have
    /// siblings, and it must not sit at the end of the list the edge points
    /// out of.
    #[must_use]
    pub fn find_resize_parent(&self, window: NodeId, target: ResizeTarget) -> Option<NodeId> {
        let (allow_first, allow_last) = match target {
            ResizeTarget::Axis(_) => (true, true),
            ResizeTarget::Edge(edge) => (
                !edge.intersects(Edges::TOP | Edges::LEFT),
                !edge.intersects(Edges::RIGHT | Edges::BOTTOM),
            ),
        };

        let mut current = window;
        loop {
            if let Some((output, siblings, index)) = self.siblings(current) {
                let parallel =
                    self.nodes.output(output).is_some_and(|o| o.layout.axis() == target.axis());
                if parallel
                    && siblings.len() > 1
                    && (allow_first || index > 0)
                    && (allow_last || index < siblings.len() - 1)
                {
                    return Some(current);
                }
            }

            let parent = self.nodes.parent(current)?;
            if parent == current || self.nodes.window(parent).is_none() {
                return None;
            }
            current = parent;
        }
    }

    /// The neighbour on the other side of `edge`.
    #[must_use]
    pub fn resize_sibling(&self, window: NodeId, edge: Edges) -> Option<NodeId> {
        let (_, siblings, index) = self.siblings(window)?;
        if edge.is_leading() {
            index.checked_sub(1).and_then(|prev| siblings.get(prev).copied())
        } else {
            siblings.get(index + 1).copied()
        }
    }

    /// Whether `edge` of a window borders the output rather than a sibling.
    #[must_use]
    pub fn edge_is_external(&self, window: NodeId, edge: Edges) -> bool {
        self.find_resize_parent(window, ResizeTarget::Edge(edge)).is_none()
    }

    /// Grow a tiled window by `amount` pixels towards `target`.
    ///
    /// Returns whether the resize was applied.
    pub fn resize_tiled(&mut self, window: NodeId, target: ResizeTarget, amount: i32) -> bool {
        let Some(resized) = self.find_resize_parent(window, target) else {
            tracing::trace!(window = %window, ?target, "no resize parent in this direction");
            return false;
        };
        let Some((output, siblings, index)) = self.siblings(resized) else {
            return false;
        };

        let mut con = resized;
        let mut amount = amount;
        let mut prev = None;
        let next;
        match target {
            ResizeTarget::Axis(_) => {
                if index == 0 {
                    next = siblings[1];
                } else if index == siblings.len() - 1 {
                    next = con;
                    con = siblings[index - 1];
                    amount = -amount;
                } else {
                    prev = Some(siblings[index - 1]);
                    next = siblings[index + 1];
                }
            }
            ResizeTarget::Edge(edge) if edge.is_leading() => {
                if !crate::soft_assert!(index > 0, window = %resized, "didn't expect first child") {
                    return false;
                }
                next = con;
                con = siblings[index - 1];
                amount = -amount;
            }
            ResizeTarget::Edge(_) => {
                if !crate::soft_assert!(index < siblings.len() - 1, window = %resized, "didn't expect last child") {
                    return false;
                }
                next = siblings[index + 1];
            }
        }

        let axis = target.axis();
        let amount = f64::from(amount);
        let sibling_amount = if prev.is_some() { (amount / 2.0).ceil() } else { amount };

        let extent = |id: NodeId| self.nodes.window(id).map_or(0.0, |w| w.extent(axis));
        if extent(con) + amount < self.min_extent(con, axis)
            || extent(next) - sibling_amount < self.min_extent(next, axis)
            || prev.is_some_and(|prev| extent(prev) - sibling_amount < self.min_extent(prev, axis))
        {
            tracing::trace!(window = %con, amount, "resize would go below minimum size");
            return false;
        }

        let child_total = self.nodes.window(con).map_or(0.0, |w| w.child_total(axis));
        if child_total <= 0.0 {
            return false;
        }

        // Snap every fraction to whole pixels before adjusting.
        for &sibling in &siblings {
            if let Some(w) = self.nodes.window_mut(sibling) {
                let total = w.child_total(axis);
                if total > 0.0 {
                    let snapped = w.extent(axis) / total;
                    w.set_fraction(axis, snapped);
                }
            }
        }

        let amount_fraction = amount / child_total;
        let sibling_fraction = if prev.is_some() { amount_fraction / 2.0 } else { amount_fraction };
        let mut adjust = |id: NodeId, delta: f64| {
            if let Some(w) = self.nodes.window_mut(id) {
                let fraction = w.fraction(axis) + delta;
                w.set_fraction(axis, fraction);
            }
        };
        adjust(con, amount_fraction);
        adjust(next, -sibling_fraction);
        if let Some(prev) = prev {
            adjust(prev, -sibling_fraction);
        }

        tracing::debug!(window = %con, ?axis, amount, "resized tiled window");
        self.arrange_output(output);
        true
    }
}
