//! Default seatop: hover tracking and click handling.

use super::{DefaultState, Seatop};
use crate::compositor::{Compositor, HitTarget};
use crate::config::FocusFollowsMouse;
use crate::constants::buttons::{BTN_LEFT, BTN_RIGHT};
use crate::seat::SeatId;
use crate::tree::{Edges, NodeId};

impl Compositor {
    pub(super) fn default_pointer_motion(&mut self, seat: SeatId, data: DefaultState) {
        let Some(cursor) = self.seat(seat).map(|s| (s.cursor.x, s.cursor.y)) else {
            return;
        };
        let hit = self.node_at_coords(cursor.0, cursor.1);
        let hovered = hit.node();

        match self.config.focus_follows_mouse {
            FocusFollowsMouse::No => {}
            FocusFollowsMouse::Yes => {
                if hovered.is_some() && hovered != data.previous_hover {
                    self.focus_hovered(seat, &hit);
                }
            }
            FocusFollowsMouse::Always => self.focus_hovered(seat, &hit),
        }

        self.route_pointer(seat, &hit);
        self.set_seatop(seat, Seatop::Default(DefaultState { previous_hover: hovered }));
    }

    /// Give focus to whatever the pointer hovers.
    fn focus_hovered(&mut self, seat: SeatId, hit: &HitTarget) {
        if let Some(window) = hit.window {
            self.seat_set_focus(seat, window);
            return;
        }
        let Some(output) = hit.output else {
            return;
        };
        let focused_output = self.seat_get_focus(seat).and_then(|focus| self.nodes.parent(focus));
        if focused_output == Some(output) {
            return;
        }
        if let Some(target) = self.seat_get_focus_inactive(seat, output) {
            self.seat_set_focus(seat, target);
        }
    }

    /// Send pointer enter/motion to the hit surface, or clear pointer focus.
    fn route_pointer(&mut self, seat: SeatId, hit: &HitTarget) {
        match (hit.window, hit.surface) {
            (Some(window), Some((sx, sy))) => self.notify_pointer(seat, window, sx, sy),
            _ => self.clear_pointer_focus(seat),
        }
    }

    pub(super) fn default_pointer_button(
        &mut self,
        seat: SeatId,
        button: u32,
        pressed: bool,
        resize_modifier: bool,
    ) {
        if !pressed {
            self.notify_button(seat, button, pressed);
            return;
        }

        let Some((cx, cy, pressed_count)) =
            self.seat(seat).map(|s| (s.cursor.x, s.cursor.y, s.cursor.pressed_count()))
        else {
            return;
        };
        let hit = self.node_at_coords(cx, cy);

        let Some(window) = hit.window else {
            // Empty output area.
            if let Some(output) = hit.output {
                let target = self.seat_get_focus_inactive(seat, output).unwrap_or(output);
                self.seat_set_focus(seat, target);
            }
            self.notify_button(seat, button, pressed);
            return;
        };

        // Resize through a border on an internal edge.
        let edge = self.internal_edges(window, hit.border_edges);
        if button == BTN_LEFT && !edge.is_empty() {
            self.seat_set_focus(seat, window);
            self.seatop_begin_resize_tiling(seat, window, edge);
            return;
        }

        // Resize through the modifier, using the quadrant under the cursor.
        if resize_modifier && button == BTN_RIGHT {
            if let Some(rect) = self.nodes.window(window).map(|w| w.box_rect()) {
                let mut edge = if cx > rect.x + rect.width / 2.0 { Edges::RIGHT } else { Edges::LEFT };
                edge |= if cy > rect.y + rect.height / 2.0 { Edges::BOTTOM } else { Edges::TOP };
                self.seat_set_focus(seat, window);
                self.seatop_begin_resize_tiling(seat, window, edge);
                return;
            }
        }

        if let Some((sx, sy)) = hit.surface.filter(|_| pressed_count == 1) {
            self.seat_set_focus(seat, window);
            self.commit_dirty();
            self.seatop_begin_down(seat, window, sx, sy);
            self.notify_button(seat, button, pressed);
            return;
        }

        // Decorations, or a second button while one is already held.
        let target = self.seat_get_focus_inactive(seat, window).unwrap_or(window);
        self.seat_set_focus(seat, target);
        self.commit_dirty();
        self.notify_button(seat, button, pressed);
    }

    /// Keep only the border edges that face a sibling.
    fn internal_edges(&self, window: NodeId, edges: Edges) -> Edges {
        [Edges::LEFT, Edges::RIGHT, Edges::TOP, Edges::BOTTOM]
            .into_iter()
            .filter(|&edge| edges.contains(edge) && !self.edge_is_external(window, edge))
            .fold(Edges::empty(), |acc, edge| acc | edge)
    }

    pub(super) fn default_rebase(&mut self, seat: SeatId) {
        let Some((cx, cy)) = self.seat(seat).map(|s| (s.cursor.x, s.cursor.y)) else {
            return;
        };
        let hit = self.node_at_coords(cx, cy);
        self.route_pointer(seat, &hit);
        self.set_seatop(seat, Seatop::Default(DefaultState { previous_hover: hit.node() }));
    }
}

#[cfg(test)]
mod tests {
    use crate::compositor::Compositor;
    use crate::config::{FocusFollowsMouse, LatticeConfig};
    use crate::constants::buttons::{BTN_LEFT, BTN_RIGHT};
    use crate::events::CoreEvent;
    use crate::seat::{SeatId, Seatop};
    use crate::tree::{BorderStyle, Edges, NodeId};
    use crate::view::{AckPolicy, ClientHandle, SimulatedView, ViewKind};

    /// Two windows side by side on a 1000x500 output, fully applied.
    fn setup(ffm: FocusFollowsMouse) -> (Compositor, SeatId, NodeId, Vec<NodeId>, Vec<ClientHandle>) {
        let mut config = LatticeConfig::default();
        config.focus_follows_mouse = ffm;
        config.border.style = BorderStyle::Pixel;
        config.border.thickness = 2.0;
        let mut compositor = Compositor::new(config);
        let output = compositor.add_output("DP-1", 1000.0, 500.0).unwrap();

        let mut windows = Vec::new();
        let mut clients = Vec::new();
        for title in ["left", "right"] {
            let (view, client) = SimulatedView::new(ViewKind::Shell, AckPolicy::Immediate);
            windows.push(compositor.map_window(output, title, Some(Box::new(view))).unwrap());
            clients.push(client);
        }
        compositor.flush();
        for &window in &windows {
            compositor.notify_ready_immediately(window);
        }
        compositor.flush();
        for &window in &windows {
            compositor.notify_ready_immediately(window);
        }
        let seat = compositor.default_seat().unwrap();
        (compositor, seat, output, windows, clients)
    }

    #[test]
    fn test_motion_enters_surface_with_local_coordinates() {
        let (mut compositor, seat, _, windows, _) = setup(FocusFollowsMouse::No);
        let mut events = compositor.subscribe();

        compositor.pointer_motion_absolute(seat, 100.0, 100.0);

        let focus = compositor.seat(seat).unwrap().pointer_focus.unwrap();
        assert_eq!(focus.window, windows[0]);
        assert_eq!((focus.sx, focus.sy), (98.0, 98.0));
        assert!(matches!(events.try_recv().unwrap(), CoreEvent::PointerEnter { .. }));

        compositor.pointer_motion(seat, 5.0, 0.0);
        assert!(matches!(events.try_recv().unwrap(), CoreEvent::PointerMotion { sx, .. } if sx == 103.0));
    }

    #[test]
    fn test_motion_over_border_clears_pointer_focus() {
        let (mut compositor, seat, _, _, _) = setup(FocusFollowsMouse::No);
        compositor.pointer_motion_absolute(seat, 100.0, 100.0);

        compositor.pointer_motion_absolute(seat, 499.0, 100.0);

        assert!(compositor.seat(seat).unwrap().pointer_focus.is_none());
    }

    #[test]
    fn test_focus_follows_mouse_yes_focuses_on_hover_change() {
        let (mut compositor, seat, _, windows, _) = setup(FocusFollowsMouse::Yes);
        assert_eq!(compositor.seat_get_focus(seat), Some(windows[1]));

        // The cursor starts at the origin, over the left window.
        compositor.pointer_motion_absolute(seat, 600.0, 100.0);
        compositor.pointer_motion_absolute(seat, 100.0, 100.0);
        assert_eq!(compositor.seat_get_focus(seat), Some(windows[0]));

        // Keyboard focus moves away; hovering the same window keeps it there.
        compositor.seat_set_focus(seat, windows[1]);
        compositor.pointer_motion_absolute(seat, 110.0, 100.0);
        assert_eq!(compositor.seat_get_focus(seat), Some(windows[1]));
    }

    #[test]
    fn test_focus_follows_mouse_always_refocuses_every_motion() {
        let (mut compositor, seat, _, windows, _) = setup(FocusFollowsMouse::Always);
        compositor.pointer_motion_absolute(seat, 100.0, 100.0);
        compositor.seat_set_focus(seat, windows[1]);

        compositor.pointer_motion_absolute(seat, 110.0, 100.0);

        assert_eq!(compositor.seat_get_focus(seat), Some(windows[0]));
    }

    #[test]
    fn test_focus_follows_mouse_no_never_focuses() {
        let (mut compositor, seat, _, windows, _) = setup(FocusFollowsMouse::No);
        compositor.pointer_motion_absolute(seat, 100.0, 100.0);
        assert_eq!(compositor.seat_get_focus(seat), Some(windows[1]));
    }

    #[test]
    fn test_press_on_surface_begins_down() {
        let (mut compositor, seat, _, windows, _) = setup(FocusFollowsMouse::No);
        compositor.pointer_motion_absolute(seat, 100.0, 100.0);

        compositor.pointer_button(seat, BTN_LEFT, true, false);

        assert_eq!(compositor.seat_get_focus(seat), Some(windows[0]));
        assert!(matches!(compositor.seat(seat).unwrap().seatop(), Seatop::Down(d) if d.window == windows[0]));
    }

    #[test]
    fn test_press_on_internal_border_begins_resize() {
        let (mut compositor, seat, _, windows, clients) = setup(FocusFollowsMouse::No);
        compositor.pointer_motion_absolute(seat, 499.0, 100.0);

        compositor.pointer_button(seat, BTN_LEFT, true, false);

        let Seatop::ResizeTiling(data) = *compositor.seat(seat).unwrap().seatop() else {
            panic!("expected resize-tiling seatop");
        };
        assert_eq!(data.edge, Edges::RIGHT);
        assert_eq!(data.h_container, Some(windows[0]));
        assert_eq!(data.h_sibling, Some(windows[1]));
        assert!(clients[0].borrow().resizing);
        assert!(clients[1].borrow().resizing);
    }

    #[test]
    fn test_press_on_external_border_does_not_resize() {
        let (mut compositor, seat, _, windows, _) = setup(FocusFollowsMouse::No);
        compositor.pointer_motion_absolute(seat, 1.0, 100.0);

        compositor.pointer_button(seat, BTN_LEFT, true, false);

        assert!(matches!(compositor.seat(seat).unwrap().seatop(), Seatop::Default(_)));
        assert_eq!(compositor.seat_get_focus(seat), Some(windows[0]));
    }

    #[test]
    fn test_modifier_right_click_resizes_by_quadrant() {
        let (mut compositor, seat, _, windows, _) = setup(FocusFollowsMouse::No);
        compositor.pointer_motion_absolute(seat, 400.0, 100.0);

        compositor.pointer_button(seat, BTN_RIGHT, true, true);

        let Seatop::ResizeTiling(data) = *compositor.seat(seat).unwrap().seatop() else {
            panic!("expected resize-tiling seatop");
        };
        assert_eq!(data.edge, Edges::RIGHT | Edges::TOP);
        assert_eq!(data.h_container, Some(windows[0]));
        assert_eq!(data.v_container, None);
    }

    #[test]
    fn test_second_button_does_not_begin_down() {
        let (mut compositor, seat, _, _, _) = setup(FocusFollowsMouse::No);
        compositor.pointer_motion_absolute(seat, 100.0, 100.0);

        // Leave the first button held but drop its down grab.
        compositor.pointer_button(seat, BTN_RIGHT, true, false);
        compositor.seatop_end(seat);
        compositor.pointer_button(seat, BTN_LEFT, true, false);

        assert!(matches!(compositor.seat(seat).unwrap().seatop(), Seatop::Default(_)));
    }
}
