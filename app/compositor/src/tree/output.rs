//! Output payload: one display and its flat window list.

use serde::Serialize;
use smallvec::SmallVec;

use super::geometry::{Rect, SplitLayout};
use super::node::NodeId;

/// Window list of an output.
pub type WindowList = SmallVec<[NodeId; 8]>;

/// Applied state of an output.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OutputState {
    pub windows: WindowList,
    pub active: bool,
    pub layout_box: Rect,
}

/// A display.
#[derive(Debug)]
pub struct Output {
    pub name: String,
    pub enabled: bool,
    pub layout: SplitLayout,
    /// Position and size in the global layout.
    pub layout_box: Rect,
    /// Layout box minus exclusive zones, in global coordinates.
    pub usable_area: Rect,
    pub scale: f64,
    /// Mode size in physical pixels.
    pub mode_size: (f64, f64),
    /// Position requested by configuration; `None` means auto-placed.
    pub configured_position: Option<(f64, f64)>,
    /// Usable area relative to the output origin, when exclusive zones
    /// reserve part of it.
    pub reserved_area: Option<Rect>,
    pub windows: WindowList,
    /// Whether the output holds the keyboard focus of some seat.
    pub active: bool,
    pub current: OutputState,
}

impl Output {
    /// Create an enabled output with the given mode size.
    #[must_use]
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        let layout_box = Rect::new(0.0, 0.0, width, height);
        Self {
            name: name.into(),
            enabled: true,
            layout: SplitLayout::default(),
            layout_box,
            usable_area: layout_box,
            scale: 1.0,
            mode_size: (width, height),
            configured_position: None,
            reserved_area: None,
            windows: WindowList::new(),
            active: false,
            current: OutputState::default(),
        }
    }

    /// Create the disabled output that collects evacuated windows.
    #[must_use]
    pub fn fallback(name: impl Into<String>) -> Self {
        let mut output = Self::new(name, 0.0, 0.0);
        output.enabled = false;
        output
    }

    /// Snapshot of the pending state.
    #[must_use]
    pub fn pending_state(&self) -> OutputState {
        OutputState { windows: self.windows.clone(), active: self.active, layout_box: self.layout_box }
    }

    /// Position of a window in the pending list.
    #[must_use]
    pub fn index_of(&self, window: NodeId) -> Option<usize> {
        self.windows.iter().position(|&id| id == window)
    }

    /// Remove a window from the pending list. Returns its former index.
    pub fn remove_window(&mut self, window: NodeId) -> Option<usize> {
        let index = self.index_of(window)?;
        self.windows.remove(index);
        Some(index)
    }

    /// Insert a window at `index`, clamped to the list length.
    pub fn insert_window(&mut self, index: usize, window: NodeId) {
        let index = index.min(self.windows.len());
        self.windows.insert(index, window);
    }

    /// Size of the output in logical pixels.
    #[must_use]
    pub fn logical_size(&self) -> (f64, f64) {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        (self.mode_size.0 / scale, self.mode_size.1 / scale)
    }
}
