//! Arrangement: computing pending geometry from parent boxes and fractions.
//!
//! Arrangement never touches `current` state. It only writes pending
//! geometry and marks the affected nodes dirty so the next transaction
//! picks them up.

use crate::compositor::Compositor;
use crate::tree::{Axis, NodeId, Rect, SplitLayout};

/// Result of splitting a parent box among its children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arrangement {
    /// Box of each child, in list order.
    pub boxes: Vec<Rect>,
    /// Extent shared by the children along the layout axis (parent extent
    /// minus gaps).
    pub child_total: f64,
}

/// Split `parent` among children with the given fractions.
///
/// Children with a fraction `<= 0` are new and receive the average of the
/// existing fractions (or `1.0` when there are none). Fractions are then
/// normalized to sum to one and written back. The last child absorbs the
/// rounding remainder so the children plus gaps cover the parent exactly.
#[must_use]
pub fn arrange_children(
    fractions: &mut [f64],
    parent: Rect,
    layout: SplitLayout,
    inner_gap: f64,
) -> Arrangement {
    let count = fractions.len();
    if count == 0 {
        return Arrangement::default();
    }

    let new_children = fractions.iter().filter(|&&f| f <= 0.0).count();
    let current_total: f64 = fractions.iter().sum();
    let existing = count - new_children;

    let mut total = 0.0;
    for fraction in fractions.iter_mut() {
        if *fraction <= 0.0 {
            *fraction = if current_total <= 0.0 {
                1.0
            } else if existing > 0 {
                #[allow(clippy::cast_precision_loss)]
                let share = current_total / existing as f64;
                share
            } else {
                current_total
            };
        }
        total += *fraction;
    }
    for fraction in fractions.iter_mut() {
        *fraction /= total;
    }

    let axis = layout.axis();
    #[allow(clippy::cast_precision_loss)]
    let gaps = inner_gap * (count - 1) as f64;
    let child_total = parent.extent(axis) - gaps;

    let mut boxes = Vec::with_capacity(count);
    let mut offset = match axis {
        Axis::Horizontal => parent.x,
        Axis::Vertical => parent.y,
    };
    for (index, fraction) in fractions.iter().enumerate() {
        let mut extent = (fraction * child_total).round();
        if index == count - 1 {
            extent = match axis {
                Axis::Horizontal => parent.right() - offset,
                Axis::Vertical => parent.bottom() - offset,
            };
        }
        let child = match axis {
            Axis::Horizontal => Rect::new(offset, parent.y, extent, parent.height),
            Axis::Vertical => Rect::new(parent.x, offset, parent.width, extent),
        };
        offset += extent + inner_gap;
        boxes.push(child);
    }

    Arrangement { boxes, child_total }
}

impl Compositor {
    /// Recompute a window's content box and queue it.
    pub fn arrange_window(&mut self, id: NodeId) {
        let Some(window) = self.nodes.window_mut(id) else {
            return;
        };
        window.autoconfigure_content();
        self.mark_dirty(id);
    }

    /// Recompute an output's boxes and lay out its windows.
    pub fn arrange_output(&mut self, id: NodeId) {
        let gap = self.config.gaps.inner.max(0.0);
        let Some(output) = self.nodes.output_mut(id) else {
            return;
        };

        let layout_box = output.layout_box;
        output.usable_area = output.reserved_area.map_or(layout_box, |area| {
            Rect::new(layout_box.x + area.x, layout_box.y + area.y, area.width, area.height)
        });
        let usable = output.usable_area;
        let layout = output.layout;
        let windows = output.windows.clone();
        self.mark_dirty(id);

        let axis = layout.axis();
        let mut fractions: Vec<f64> =
            windows.iter().map(|&w| self.nodes.window(w).map_or(0.0, |window| window.fraction(axis))).collect();
        let arrangement = arrange_children(&mut fractions, usable, layout, gap);

        for ((&window_id, rect), fraction) in windows.iter().zip(&arrangement.boxes).zip(&fractions) {
            let Some(window) = self.nodes.window_mut(window_id) else {
                continue;
            };
            window.set_fraction(axis, *fraction);
            window.set_child_total(axis, arrangement.child_total);
            window.set_box(*rect);
            self.arrange_window(window_id);
        }
        tracing::trace!(output = %id, windows = windows.len(), "arranged output");
    }

    /// Position every enabled output and arrange each.
    ///
    /// Outputs with a configured position keep it; the rest are placed left
    /// to right after the right-most configured output.
    pub fn arrange_root(&mut self) {
        let outputs = self.outputs.clone();

        let mut next_x = outputs
            .iter()
            .filter_map(|&id| self.nodes.output(id))
            .filter_map(|output| {
                let (x, _) = output.configured_position?;
                Some(x + output.logical_size().0)
            })
            .fold(0.0_f64, f64::max);

        for &id in &outputs {
            let Some(output) = self.nodes.output_mut(id) else {
                continue;
            };
            let (width, height) = output.logical_size();
            let (x, y) = output.configured_position.unwrap_or_else(|| {
                let position = (next_x, 0.0);
                next_x += width;
                position
            });
            output.layout_box = Rect::new(x, y, width, height);
        }

        for id in outputs {
            self.arrange_output(id);
        }
        let fallback = self.fallback_output;
        self.arrange_output(fallback);
    }

    /// Arrange the output that owns a node.
    pub fn arrange_parent_of(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes.parent(id) {
            self.arrange_output(parent);
        }
    }
}
