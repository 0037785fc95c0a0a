//! Seat operations: the per-seat input-dispatch state machine.
//!
//! A seat is always in exactly one state:
//!
//! - [`Seatop::Default`]: hover tracking, click-to-focus, focus follows mouse.
//! - [`Seatop::Down`]: a button was pressed over a window; motion keeps being
//!   delivered to that window until every button is released.
//! - [`Seatop::ResizeTiling`]: an interactive drag resize of tiled windows.
//!
//! Every exit goes back to `Default`, and the state's data is dropped with
//! it. Input entry points update the cursor before dispatching.

mod default;
mod down;
mod resize_tiling;

pub use down::DownState;
pub use resize_tiling::ResizeTilingState;

use super::SeatId;
use crate::compositor::Compositor;
use crate::constants::buttons::BTN_LEFT;
use crate::events::CoreEvent;
use crate::tree::{Axis, NodeId};

/// Data of the default state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DefaultState {
    /// Node under the cursor at the previous motion event.
    pub previous_hover: Option<NodeId>,
}

/// The input-dispatch state of a seat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Seatop {
    Default(DefaultState),
    Down(DownState),
    ResizeTiling(ResizeTilingState),
}

impl Default for Seatop {
    fn default() -> Self { Self::Default(DefaultState::default()) }
}

impl Seatop {
    /// Returns the state name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default(_) => "default",
            Self::Down(_) => "down",
            Self::ResizeTiling(_) => "resize-tiling",
        }
    }
}

impl Compositor {
    fn seatop_of(&self, seat: SeatId) -> Option<Seatop> { self.seat(seat).map(|s| s.seatop) }

    fn set_seatop(&mut self, seat: SeatId, seatop: Seatop) {
        if let Some(state) = self.seat_mut(seat) {
            tracing::trace!(seat = %seat, from = state.seatop.name(), to = seatop.name(), "seatop transition");
            state.seatop = seatop;
        }
    }

    // ========================================================================
    // Input entry points
    // ========================================================================

    /// Move the cursor by a relative amount.
    pub fn pointer_motion(&mut self, seat: SeatId, dx: f64, dy: f64) {
        let Some(state) = self.seat(seat) else {
            return;
        };
        let (x, y) = (state.cursor.x + dx, state.cursor.y + dy);
        self.pointer_motion_absolute(seat, x, y);
    }

    /// Warp the cursor to a layout position.
    pub fn pointer_motion_absolute(&mut self, seat: SeatId, lx: f64, ly: f64) {
        let Some(state) = self.seat_mut(seat) else {
            return;
        };
        state.cursor.x = lx;
        state.cursor.y = ly;

        match self.seatop_of(seat) {
            Some(Seatop::Default(data)) => self.default_pointer_motion(seat, data),
            Some(Seatop::Down(data)) => self.down_pointer_motion(seat, data),
            Some(Seatop::ResizeTiling(data)) => self.resize_tiling_pointer_motion(seat, data),
            None => {}
        }
    }

    /// A pointer button changed state.
    ///
    /// `resize_modifier` reports whether the configured resize modifier key
    /// is held.
    pub fn pointer_button(&mut self, seat: SeatId, button: u32, pressed: bool, resize_modifier: bool) {
        let Some(state) = self.seat_mut(seat) else {
            return;
        };
        let changed = if pressed { state.cursor.press(button) } else { state.cursor.release(button) };
        if !changed {
            tracing::trace!(seat = %seat, button, pressed, "ignoring repeated button state");
            return;
        }

        match self.seatop_of(seat) {
            Some(Seatop::Default(_)) => self.default_pointer_button(seat, button, pressed, resize_modifier),
            Some(Seatop::Down(_)) => self.down_pointer_button(seat, button, pressed),
            Some(Seatop::ResizeTiling(data)) => self.resize_tiling_pointer_button(seat, data),
            None => {}
        }
    }

    /// A scroll event.
    pub fn pointer_axis(&mut self, seat: SeatId, axis: Axis, delta: f64) {
        match self.seatop_of(seat) {
            Some(Seatop::Default(_) | Seatop::Down(_)) => {
                let Some(focus) = self.seat(seat).and_then(|s| s.pointer_focus) else {
                    return;
                };
                self.events.emit(CoreEvent::PointerAxis { seat, window: focus.window, axis, delta });
            }
            Some(Seatop::ResizeTiling(_)) | None => {}
        }
    }

    /// Tablet tool motion behaves like absolute pointer motion.
    pub fn tablet_tool_motion(&mut self, seat: SeatId, lx: f64, ly: f64) {
        self.pointer_motion_absolute(seat, lx, ly);
    }

    /// Tablet tool tip contact behaves like the primary button.
    pub fn tablet_tool_tip(&mut self, seat: SeatId, down: bool) {
        self.pointer_button(seat, BTN_LEFT, down, false);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Re-evaluate pointer focus at the current cursor position.
    pub fn seatop_rebase(&mut self, seat: SeatId) {
        if let Some(Seatop::Default(_)) = self.seatop_of(seat) {
            self.default_rebase(seat);
        }
    }

    /// A window is going away; abandon any operation that targets it.
    pub fn seatop_unref(&mut self, seat: SeatId, window: NodeId) {
        match self.seatop_of(seat) {
            Some(Seatop::Down(data)) if data.window == window => {
                tracing::debug!(seat = %seat, window = %window, "down target destroyed");
                self.seatop_begin_default(seat);
            }
            Some(Seatop::ResizeTiling(data)) if data.involves(window) => {
                tracing::debug!(seat = %seat, window = %window, "resize target destroyed");
                self.clear_resizing(&data, Some(window));
                self.seatop_begin_default(seat);
            }
            _ => {}
        }
    }

    /// End the current operation without rebasing.
    pub fn seatop_end(&mut self, seat: SeatId) {
        if let Some(Seatop::ResizeTiling(data)) = self.seatop_of(seat) {
            self.clear_resizing(&data, None);
        }
        self.set_seatop(seat, Seatop::default());
    }

    /// Return to the default state and re-run hit testing.
    pub fn seatop_begin_default(&mut self, seat: SeatId) {
        self.set_seatop(seat, Seatop::default());
        self.seatop_rebase(seat);
    }

    /// Forward a button event to the surface under the pointer.
    fn notify_button(&mut self, seat: SeatId, button: u32, pressed: bool) {
        let window = self.seat(seat).and_then(|s| s.pointer_focus).map(|focus| focus.window);
        self.events.emit(CoreEvent::PointerButton { seat, window, button, pressed });
    }

    /// Route pointer events to a surface, announcing the enter if needed.
    fn notify_pointer(&mut self, seat: SeatId, window: NodeId, sx: f64, sy: f64) {
        let Some(state) = self.seat_mut(seat) else {
            return;
        };
        let entered = state.pointer_focus.is_none_or(|focus| focus.window != window);
        state.pointer_focus = Some(super::PointerFocus { window, sx, sy });

        let event = if entered {
            CoreEvent::PointerEnter { seat, window, sx, sy }
        } else {
            CoreEvent::PointerMotion { seat, window, sx, sy }
        };
        self.events.emit(event);
    }

    fn clear_pointer_focus(&mut self, seat: SeatId) {
        let Some(state) = self.seat_mut(seat) else {
            return;
        };
        if state.pointer_focus.take().is_some() {
            self.events.emit(CoreEvent::PointerCleared { seat });
        }
    }
}
