//! Hit testing against the applied (`current`) tree.

use super::Compositor;
use crate::tree::{BorderStyle, Edges, NodeId, Rect, Window};

/// What lies under a layout position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HitTarget {
    /// The output containing the position.
    pub output: Option<NodeId>,
    /// The window whose box contains the position.
    pub window: Option<NodeId>,
    /// Surface-local coordinates when the position is over client content.
    pub surface: Option<(f64, f64)>,
    /// Border edges under the position; empty over content.
    pub border_edges: Edges,
}

impl HitTarget {
    /// The most specific node under the position.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> { self.window.or(self.output) }
}

impl Compositor {
    /// Find the output, window, and surface under a layout position.
    #[must_use]
    pub fn node_at_coords(&self, lx: f64, ly: f64) -> HitTarget {
        let Some((output_id, windows)) = self.outputs.iter().find_map(|&id| {
            let output = self.nodes.output(id)?;
            (output.enabled && output.current.layout_box.contains_point(lx, ly))
                .then(|| (id, output.current.windows.clone()))
        }) else {
            return HitTarget::default();
        };

        let mut hit = HitTarget { output: Some(output_id), ..HitTarget::default() };
        let Some((window_id, window)) = windows.iter().find_map(|&id| {
            let node = self.nodes.get(id).filter(|node| !node.destroying)?;
            let window = node.as_window()?;
            window.current.box_rect().contains_point(lx, ly).then_some((id, window))
        }) else {
            return hit;
        };

        hit.window = Some(window_id);
        hit.surface = surface_at(window, lx, ly);
        if hit.surface.is_none() {
            hit.border_edges = border_edges(window, lx, ly);
        }
        hit
    }
}

/// Surface-local coordinates of a position over a window's client surface.
fn surface_at(window: &Window, lx: f64, ly: f64) -> Option<(f64, f64)> {
    let view = window.view.as_deref()?;
    let geometry = view.geometry();
    if !geometry.is_valid() {
        return None;
    }

    let content = window.current.content_rect();
    let surface = Rect::new(
        content.x + window.surface_x,
        content.y + window.surface_y,
        geometry.width.min(content.width),
        geometry.height.min(content.height),
    );
    surface.contains_point(lx, ly).then(|| (lx - surface.x, ly - surface.y))
}

/// Border edges of a window's applied box under a position.
fn border_edges(window: &Window, lx: f64, ly: f64) -> Edges {
    let state = &window.current;
    if window.view.is_none() || state.border == BorderStyle::None || state.border_thickness <= 0.0 {
        return Edges::empty();
    }

    let thickness = state.border_thickness;
    let mut edges = Edges::empty();
    if lx < state.x + thickness {
        edges |= Edges::LEFT;
    }
    if ly < state.y + thickness {
        edges |= Edges::TOP;
    }
    if lx >= state.x + state.width - thickness {
        edges |= Edges::RIGHT;
    }
    if ly >= state.y + state.height - thickness {
        edges |= Edges::BOTTOM;
    }
    edges
}
