//! Down seatop: pointer grab on the window that received a button press.

use super::Seatop;
use crate::compositor::Compositor;
use crate::seat::SeatId;
use crate::tree::NodeId;

/// Data of the down state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DownState {
    /// The window that received the press.
    pub window: NodeId,
    /// Cursor position at the press, in layout coordinates.
    pub ref_lx: f64,
    pub ref_ly: f64,
    /// Surface-local position at the press.
    pub ref_sx: f64,
    pub ref_sy: f64,
}

impl Compositor {
    /// Grab the pointer for `window`, pressed at surface position `(sx, sy)`.
    pub fn seatop_begin_down(&mut self, seat: SeatId, window: NodeId, sx: f64, sy: f64) {
        let Some((ref_lx, ref_ly)) = self.seat(seat).map(|s| (s.cursor.x, s.cursor.y)) else {
            return;
        };
        self.set_seatop(seat, Seatop::Down(DownState { window, ref_lx, ref_ly, ref_sx: sx, ref_sy: sy }));
        self.commit_dirty();
    }

    pub(super) fn down_pointer_motion(&mut self, seat: SeatId, data: DownState) {
        let Some((cx, cy)) = self.seat(seat).map(|s| (s.cursor.x, s.cursor.y)) else {
            return;
        };
        if self.nodes.get(data.window).is_none_or(|node| node.destroying) {
            return;
        }
        let sx = data.ref_sx + (cx - data.ref_lx);
        let sy = data.ref_sy + (cy - data.ref_ly);
        self.notify_pointer(seat, data.window, sx, sy);
    }

    pub(super) fn down_pointer_button(&mut self, seat: SeatId, button: u32, pressed: bool) {
        self.notify_button(seat, button, pressed);
        if self.seat(seat).is_some_and(|s| s.cursor.pressed_count() == 0) {
            self.seatop_begin_default(seat);
        }
    }
}
