//! Message types for the compositor actor.
//!
//! Messages name outputs, windows and seats by their human-readable names so
//! they can be produced by scripts and other threads without holding node
//! ids. Views cannot cross threads, so a window message carries a
//! [`ClientSpec`] and the actor builds the simulated client itself.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::compositor::LayoutSnapshot;
use crate::tree::{Axis, Rect, SplitLayout};
use crate::view::{AckPolicy, ViewConstraints, ViewKind};

/// Description of a simulated client to attach to a new window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientSpec {
    pub kind: ViewKind,
    pub ack: AckPolicy,
    pub constraints: ViewConstraints,
}

// ============================================================================
// Compositor Messages
// ============================================================================

/// Messages sent to the compositor actor.
#[derive(Debug)]
pub enum CompositorMessage {
    // ════════════════════════════════════════════════════════════════════════
    // Outputs
    // ════════════════════════════════════════════════════════════════════════
    /// A display was connected.
    AddOutput { name: String, width: f64, height: f64 },

    /// A display was disconnected.
    DisableOutput { name: String },

    /// Exclusive zones changed the usable area (output-local).
    SetUsableArea { output: String, area: Rect },

    /// Change the split layout of an output.
    SetOutputLayout { output: String, layout: SplitLayout },

    // ════════════════════════════════════════════════════════════════════════
    // Windows
    // ════════════════════════════════════════════════════════════════════════
    /// A client mapped a toplevel. `client: None` maps a window without a view.
    MapWindow { output: String, title: String, client: Option<ClientSpec> },

    /// A client unmapped its toplevel.
    UnmapWindow { title: String },

    /// Move a window to the end of another output.
    MoveWindow { title: String, output: String },

    /// Ask a window's client to close.
    CloseWindow { title: String },

    /// Deliver an acknowledgement for the latest configure of a window,
    /// regardless of the client's ack policy.
    AckConfigure { title: String },

    // ════════════════════════════════════════════════════════════════════════
    // Seats and input
    // ════════════════════════════════════════════════════════════════════════
    AddSeat { name: String },

    RemoveSeat { name: String },

    /// Give keyboard focus to a window.
    Focus { seat: String, title: String },

    /// Relative pointer motion.
    PointerMotion { seat: String, dx: f64, dy: f64 },

    /// Absolute pointer motion, in layout coordinates.
    PointerWarp { seat: String, x: f64, y: f64 },

    PointerButton { seat: String, button: u32, pressed: bool, resize_modifier: bool },

    PointerAxis { seat: String, axis: Axis, delta: f64 },

    TabletToolMotion { seat: String, x: f64, y: f64 },

    TabletToolTip { seat: String, down: bool },

    // ════════════════════════════════════════════════════════════════════════
    // Queries and control
    // ════════════════════════════════════════════════════════════════════════
    /// Query compositor state.
    Query { query: CompositorQuery, respond_to: oneshot::Sender<QueryResult> },

    /// Stop the actor.
    Shutdown,
}

impl CompositorMessage {
    /// Returns the message name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddOutput { .. } => "AddOutput",
            Self::DisableOutput { .. } => "DisableOutput",
            Self::SetUsableArea { .. } => "SetUsableArea",
            Self::SetOutputLayout { .. } => "SetOutputLayout",
            Self::MapWindow { .. } => "MapWindow",
            Self::UnmapWindow { .. } => "UnmapWindow",
            Self::MoveWindow { .. } => "MoveWindow",
            Self::CloseWindow { .. } => "CloseWindow",
            Self::AckConfigure { .. } => "AckConfigure",
            Self::AddSeat { .. } => "AddSeat",
            Self::RemoveSeat { .. } => "RemoveSeat",
            Self::Focus { .. } => "Focus",
            Self::PointerMotion { .. } => "PointerMotion",
            Self::PointerWarp { .. } => "PointerWarp",
            Self::PointerButton { .. } => "PointerButton",
            Self::PointerAxis { .. } => "PointerAxis",
            Self::TabletToolMotion { .. } => "TabletToolMotion",
            Self::TabletToolTip { .. } => "TabletToolTip",
            Self::Query { .. } => "Query",
            Self::Shutdown => "Shutdown",
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Queries answered by the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorQuery {
    /// The applied layout.
    Layout,
    /// Whether every transaction has been applied.
    Idle,
}

/// Results of [`CompositorQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Layout(LayoutSnapshot),
    Idle(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names() {
        assert_eq!(CompositorMessage::Shutdown.name(), "Shutdown");
        let msg = CompositorMessage::MapWindow {
            output: "DP-1".to_string(),
            title: "term".to_string(),
            client: None,
        };
        assert_eq!(msg.name(), "MapWindow");
    }

    #[test]
    fn test_client_spec_defaults() {
        let spec: ClientSpec = serde_json::from_str(r#"{"ack": "never"}"#).unwrap();
        assert_eq!(spec.kind, ViewKind::Shell);
        assert_eq!(spec.ack, AckPolicy::Never);
        assert_eq!(spec.constraints, ViewConstraints::default());
    }
}
