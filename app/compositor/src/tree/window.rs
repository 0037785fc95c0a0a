//! Window payload: pending geometry, the applied snapshot, and the bound view.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::geometry::{Axis, Rect};
use super::node::NodeId;
use crate::view::{View, ViewKind};

/// Outputs a window's current box intersects.
pub type OutputIdList = SmallVec<[NodeId; 2]>;

/// Border decoration of a window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BorderStyle {
    /// No decoration; content fills the box.
    None,
    /// A border of uniform thickness.
    Pixel,
    /// A titlebar on top and a border on the other sides.
    #[default]
    Normal,
}

/// Geometry and decoration state of a window, captured by a transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct WindowState {
    pub output: Option<NodeId>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub content_x: f64,
    pub content_y: f64,
    pub content_width: f64,
    pub content_height: f64,
    pub border: BorderStyle,
    pub border_thickness: f64,
    pub focused: bool,
}

impl WindowState {
    /// The outer box.
    #[must_use]
    pub const fn box_rect(&self) -> Rect { Rect::new(self.x, self.y, self.width, self.height) }

    /// The content box.
    #[must_use]
    pub const fn content_rect(&self) -> Rect {
        Rect::new(self.content_x, self.content_y, self.content_width, self.content_height)
    }
}

/// A tiled client window.
#[derive(Debug, Default)]
pub struct Window {
    pub title: String,
    /// Pending owner.
    pub output: Option<NodeId>,

    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub content_x: f64,
    pub content_y: f64,
    pub content_width: f64,
    pub content_height: f64,

    /// Share of the parent's extent along a horizontal split.
    pub width_fraction: f64,
    /// Share of the parent's extent along a vertical split.
    pub height_fraction: f64,
    /// Space the siblings were divided over at the last horizontal arrange.
    pub child_total_width: f64,
    /// Space the siblings were divided over at the last vertical arrange.
    pub child_total_height: f64,

    pub border: BorderStyle,
    pub border_thickness: f64,
    pub titlebar_height: f64,
    pub focused: bool,
    /// Set while an interactive resize grabs this window.
    pub resizing: bool,

    pub view: Option<Box<dyn View>>,
    pub current: WindowState,

    /// Frozen box of the last presented frame while a transaction waits.
    pub saved_buffer: Option<Rect>,
    /// Offset of the client surface inside the content box.
    pub surface_x: f64,
    pub surface_y: f64,
    pub outputs: OutputIdList,
}

impl Window {
    /// Create an unparented window.
    #[must_use]
    pub fn new(title: impl Into<String>, view: Option<Box<dyn View>>) -> Self {
        Self { title: title.into(), view, ..Self::default() }
    }

    /// Snapshot of the pending state.
    #[must_use]
    pub const fn pending_state(&self) -> WindowState {
        WindowState {
            output: self.output,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            content_x: self.content_x,
            content_y: self.content_y,
            content_width: self.content_width,
            content_height: self.content_height,
            border: self.border,
            border_thickness: self.border_thickness,
            focused: self.focused,
        }
    }

    /// The pending outer box.
    #[must_use]
    pub const fn box_rect(&self) -> Rect { Rect::new(self.x, self.y, self.width, self.height) }

    /// Set the pending outer box.
    pub const fn set_box(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }

    /// The kind of the bound view, if any.
    #[must_use]
    pub fn view_kind(&self) -> Option<ViewKind> { self.view.as_ref().map(|view| view.kind()) }

    /// Split fraction along an axis.
    #[must_use]
    pub const fn fraction(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width_fraction,
            Axis::Vertical => self.height_fraction,
        }
    }

    pub const fn set_fraction(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::Horizontal => self.width_fraction = value,
            Axis::Vertical => self.height_fraction = value,
        }
    }

    /// Space divided among siblings along an axis at the last arrange.
    #[must_use]
    pub const fn child_total(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.child_total_width,
            Axis::Vertical => self.child_total_height,
        }
    }

    pub const fn set_child_total(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::Horizontal => self.child_total_width = value,
            Axis::Vertical => self.child_total_height = value,
        }
    }

    /// Pending extent along an axis.
    #[must_use]
    pub const fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Reset split fractions so the next arrange treats the window as new.
    pub const fn reset_fractions(&mut self) {
        self.width_fraction = 0.0;
        self.height_fraction = 0.0;
    }

    /// Derive the pending content box from the outer box and the border.
    pub fn autoconfigure_content(&mut self) {
        if self.view.is_none() {
            self.content_x = self.x;
            self.content_y = self.y;
            self.content_width = self.width;
            self.content_height = self.height;
            return;
        }

        let thickness = self.border_thickness.max(0.0);
        let (top, side) = match self.border {
            BorderStyle::None => (0.0, 0.0),
            BorderStyle::Pixel => (thickness, thickness),
            BorderStyle::Normal => (self.titlebar_height.max(0.0), thickness),
        };

        self.content_x = self.x + side;
        self.content_y = self.y + top;
        self.content_width = (self.width - side * 2.0).max(0.0);
        self.content_height = (self.height - top - side).max(0.0);
    }

    /// Call `f` with the bound view, if any.
    pub fn with_view(&mut self, f: impl FnOnce(&mut dyn View)) {
        if let Some(view) = self.view.as_deref_mut() {
            f(view);
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::view::{AckPolicy, SimulatedView};

    fn window_with_view(border: BorderStyle) -> Window {
        let (view, _client) = SimulatedView::new(ViewKind::Shell, AckPolicy::Serial);
        let mut window = Window::new("term", Some(Box::new(view)));
        window.border = border;
        window.border_thickness = 2.0;
        window.titlebar_height = 20.0;
        window.set_box(Rect::new(0.0, 0.0, 640.0, 480.0));
        window
    }

    mod content_tests {
        use super::*;

        #[test]
        fn test_border_none_fills_box() {
            let mut window = window_with_view(BorderStyle::None);
            window.autoconfigure_content();
            assert_eq!(window.pending_state().content_rect(), Rect::new(0.0, 0.0, 640.0, 480.0));
        }

        #[test]
        fn test_border_pixel_insets_all_sides() {
            let mut window = window_with_view(BorderStyle::Pixel);
            window.autoconfigure_content();
            assert_eq!(window.pending_state().content_rect(), Rect::new(2.0, 2.0, 636.0, 476.0));
        }

        #[test]
        fn test_border_normal_reserves_titlebar() {
            let mut window = window_with_view(BorderStyle::Normal);
            window.autoconfigure_content();
            assert_eq!(window.pending_state().content_rect(), Rect::new(2.0, 20.0, 636.0, 458.0));
        }

        #[test]
        fn test_viewless_window_content_is_box() {
            let mut window = Window::new("placeholder", None);
            window.border = BorderStyle::Normal;
            window.set_box(Rect::new(5.0, 5.0, 100.0, 100.0));
            window.autoconfigure_content();
            assert_eq!(window.pending_state().content_rect(), Rect::new(5.0, 5.0, 100.0, 100.0));
        }
    }

    mod fraction_tests {
        use super::*;

        #[test]
        fn test_fraction_accessors_follow_axis() {
            let mut window = Window::new("a", None);
            window.set_fraction(Axis::Horizontal, 0.25);
            window.set_fraction(Axis::Vertical, 0.75);
            assert_eq!(window.fraction(Axis::Horizontal), 0.25);
            assert_eq!(window.fraction(Axis::Vertical), 0.75);

            window.reset_fractions();
            assert_eq!(window.fraction(Axis::Horizontal), 0.0);
        }
    }
}
