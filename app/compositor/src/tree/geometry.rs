//! Geometry primitives shared by the tree, layout, and seat modules.

use bitflags::bitflags;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Rect
// ============================================================================

/// A rectangle in layout coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Create a zero-sized rectangle at origin.
    #[must_use]
    pub const fn zero() -> Self { Self::new(0.0, 0.0, 0.0, 0.0) }

    /// Check if this rectangle has a positive area.
    #[must_use]
    pub fn is_valid(&self) -> bool { self.width > 0.0 && self.height > 0.0 }

    /// Check if this rectangle contains a point.
    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Check if this rectangle intersects with another.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// The right edge (exclusive).
    #[must_use]
    pub fn right(&self) -> f64 { self.x + self.width }

    /// The bottom edge (exclusive).
    #[must_use]
    pub fn bottom(&self) -> f64 { self.y + self.height }

    /// Extent of the rectangle along the given axis.
    #[must_use]
    pub const fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

// ============================================================================
// Axis and Layout
// ============================================================================

/// A layout axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    Vertical,
}

/// How an output splits its window list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SplitLayout {
    /// Windows side by side.
    #[default]
    Horizontal,
    /// Windows stacked top to bottom.
    Vertical,
}

impl SplitLayout {
    /// The axis children are distributed along.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Horizontal => Axis::Horizontal,
            Self::Vertical => Axis::Vertical,
        }
    }

    /// Returns the layout name as a static kebab-case string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

// ============================================================================
// Edges
// ============================================================================

bitflags! {
    /// Window edges, used for interactive and command-driven resizes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Edges: u32 {
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const RIGHT = 8;
    }
}

impl Edges {
    /// The left/right component of these edges.
    #[must_use]
    pub fn horizontal(self) -> Self { self & (Self::LEFT | Self::RIGHT) }

    /// The top/bottom component of these edges.
    #[must_use]
    pub fn vertical(self) -> Self { self & (Self::TOP | Self::BOTTOM) }

    /// Whether the edges point towards the start of their axis.
    #[must_use]
    pub fn is_leading(self) -> bool { self.intersects(Self::LEFT | Self::TOP) }
}

/// The direction of a tiled resize.
///
/// An axis resize grows towards both neighbours; an edge resize only moves
/// the named edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeTarget {
    /// Grow or shrink along an axis, taking space from both siblings.
    Axis(Axis),
    /// Move a single edge.
    Edge(Edges),
}

impl ResizeTarget {
    /// The axis this resize acts on.
    #[must_use]
    pub fn axis(self) -> Axis {
        match self {
            Self::Axis(axis) => axis,
            Self::Edge(edge) if edge.intersects(Edges::LEFT | Edges::RIGHT) => Axis::Horizontal,
            Self::Edge(_) => Axis::Vertical,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
