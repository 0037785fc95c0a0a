//! Client view capability table.
//!
//! A view is the compositor-side handle of a client surface (a shell
//! toplevel, an X11 window, a layer surface). The core only talks to views
//! through the [`View`] trait; the protocol layer supplies implementations.
//! Every capability except [`View::kind`] defaults to a no-op so a protocol
//! only implements what it supports.

mod simulated;

use serde::{Deserialize, Serialize};

pub use simulated::{AckPolicy, ClientHandle, ConfigureRequest, PendingAck, SimulatedClient, SimulatedView};

use crate::tree::Rect;

/// The protocol family a view belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    /// Windowed shell toplevel.
    #[default]
    Shell,
    /// X11 compatibility surface.
    X11Compat,
    /// Layer-shell surface.
    LayerShell,
}

impl ViewKind {
    /// Whether the client must be reconfigured when only its position changes.
    ///
    /// X11 clients ignore configure requests whose integer geometry matches
    /// the previous one, and they track their own position.
    #[must_use]
    pub const fn is_position_aware(self) -> bool { matches!(self, Self::X11Compat) }
}

/// Size limits requested by a client. Zero means unconstrained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConstraints {
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
}

/// A surface belonging to a view, relative to the view's origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceInfo {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Capabilities of a client surface.
pub trait View {
    /// The protocol family of this view.
    fn kind(&self) -> ViewKind;

    /// Ask the client to resize its content box.
    ///
    /// Returns the configure serial the client will acknowledge, or `0` when
    /// no acknowledgement will follow.
    fn configure(&mut self, _content_x: f64, _content_y: f64, _width: f64, _height: f64) -> u32 {
        0
    }

    /// Mark the view as (in)active for keyboard focus decorations.
    fn set_activated(&mut self, _activated: bool) {}

    /// Tell the client it is tiled against its neighbours.
    fn set_tiled(&mut self, _tiled: bool) {}

    /// Tell the client an interactive resize is in progress.
    fn set_resizing(&mut self, _resizing: bool) {}

    /// Ask the client to close.
    fn close(&mut self) {}

    /// Visit every surface of the view.
    fn for_each_surface(&self, _f: &mut dyn FnMut(SurfaceInfo)) {}

    /// Size limits requested by the client.
    fn constraints(&self) -> ViewConstraints { ViewConstraints::default() }

    /// Geometry of the client's last committed buffer.
    fn geometry(&self) -> Rect { Rect::zero() }
}

impl std::fmt::Debug for dyn View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View").field("kind", &self.kind()).finish_non_exhaustive()
    }
}
