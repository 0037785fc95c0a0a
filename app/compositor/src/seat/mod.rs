//! Seats: focus stacks, cursors, and input-dispatch state machines.

mod focus;
mod seatop;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub use seatop::{DefaultState, DownState, ResizeTilingState, Seatop};

use crate::tree::NodeId;

/// Seat identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(pub u32);

impl std::fmt::Display for SeatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seat-{}", self.0)
    }
}

/// Buttons currently held on a cursor, sorted ascending.
pub type ButtonList = SmallVec<[u32; 4]>;

/// Pointer position and button state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
    pressed_buttons: ButtonList,
}

impl Cursor {
    /// Record a press. Returns `false` if the button was already down.
    pub fn press(&mut self, button: u32) -> bool {
        match self.pressed_buttons.binary_search(&button) {
            Ok(_) => false,
            Err(index) => {
                self.pressed_buttons.insert(index, button);
                true
            }
        }
    }

    /// Record a release. Returns `false` if the button was not down.
    pub fn release(&mut self, button: u32) -> bool {
        match self.pressed_buttons.binary_search(&button) {
            Ok(index) => {
                self.pressed_buttons.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn is_pressed(&self, button: u32) -> bool { self.pressed_buttons.binary_search(&button).is_ok() }

    #[must_use]
    pub fn pressed_count(&self) -> usize { self.pressed_buttons.len() }

    #[must_use]
    pub fn pressed_buttons(&self) -> &[u32] { &self.pressed_buttons }
}

/// The surface receiving pointer events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerFocus {
    pub window: NodeId,
    /// Surface-local position of the last event.
    pub sx: f64,
    pub sy: f64,
}

/// A group of input devices with its own focus.
#[derive(Debug)]
pub struct Seat {
    pub id: SeatId,
    pub name: String,
    /// Most recently focused first.
    focus_stack: Vec<NodeId>,
    pub(crate) seatop: Seatop,
    pub cursor: Cursor,
    pub pointer_focus: Option<PointerFocus>,
}

impl Seat {
    #[must_use]
    pub fn new(id: SeatId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            focus_stack: Vec::new(),
            seatop: Seatop::default(),
            cursor: Cursor::default(),
            pointer_focus: None,
        }
    }

    /// Focus stack, most recent first.
    #[must_use]
    pub fn focus_stack(&self) -> &[NodeId] { &self.focus_stack }

    /// The active input-dispatch state.
    #[must_use]
    pub const fn seatop(&self) -> &Seatop { &self.seatop }

    /// Add a node at the least-recent end of the stack.
    pub(crate) fn append_focus(&mut self, node: NodeId) {
        if !self.focus_stack.contains(&node) {
            self.focus_stack.push(node);
        }
    }

    /// Move a node to the head of the stack.
    pub(crate) fn move_to_front(&mut self, node: NodeId) {
        self.focus_stack.retain(|&id| id != node);
        self.focus_stack.insert(0, node);
    }

    /// Drop every reference to a node.
    pub(crate) fn forget(&mut self, node: NodeId) {
        self.focus_stack.retain(|&id| id != node);
        if self.pointer_focus.is_some_and(|focus| focus.window == node) {
            self.pointer_focus = None;
        }
    }
}
