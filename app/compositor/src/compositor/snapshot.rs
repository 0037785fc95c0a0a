//! Read-only view of the applied layout.
//!
//! Snapshots report *current* state only, i.e. what a renderer would draw
//! right now. Pending geometry that is still waiting in a transaction does
//! not show up.

use serde::Serialize;
use tabled::Tabled;

use super::Compositor;
use crate::tree::NodeId;

/// Applied state of one output.
#[derive(Clone, Debug, PartialEq, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct OutputRow {
    #[tabled(rename = "Output")]
    pub name: String,
    #[tabled(rename = "X")]
    pub x: f64,
    #[tabled(rename = "Y")]
    pub y: f64,
    #[tabled(rename = "Width")]
    pub width: f64,
    #[tabled(rename = "Height")]
    pub height: f64,
    #[tabled(rename = "Windows")]
    pub windows: usize,
    #[tabled(rename = "Active")]
    pub active: bool,
}

/// Applied state of one window.
#[derive(Clone, Debug, PartialEq, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct WindowRow {
    #[tabled(rename = "ID")]
    pub id: NodeId,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Output")]
    pub output: String,
    #[tabled(rename = "X")]
    pub x: f64,
    #[tabled(rename = "Y")]
    pub y: f64,
    #[tabled(rename = "Width")]
    pub width: f64,
    #[tabled(rename = "Height")]
    pub height: f64,
    #[tabled(rename = "Focused")]
    pub focused: bool,
}

/// Applied layout of every enabled output.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    pub outputs: Vec<OutputRow>,
    pub windows: Vec<WindowRow>,
    /// Transactions still queued when the snapshot was taken.
    pub pending_transactions: usize,
    pub events_emitted: u64,
}

impl Compositor {
    /// Capture the applied layout, outputs in layout order and windows in
    /// list order.
    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot {
        let mut snapshot = LayoutSnapshot {
            pending_transactions: self.txns.len(),
            events_emitted: self.events.emitted(),
            ..LayoutSnapshot::default()
        };

        for &output_id in &self.outputs {
            let Some(output) = self.nodes.output(output_id) else {
                continue;
            };
            let state = &output.current;
            snapshot.outputs.push(OutputRow {
                name: output.name.clone(),
                x: state.layout_box.x,
                y: state.layout_box.y,
                width: state.layout_box.width,
                height: state.layout_box.height,
                windows: state.windows.len(),
                active: state.active,
            });

            for &window_id in &state.windows {
                let Some(window) = self.nodes.window(window_id) else {
                    continue;
                };
                let current = &window.current;
                snapshot.windows.push(WindowRow {
                    id: window_id,
                    title: window.title.clone(),
                    output: output.name.clone(),
                    x: current.x,
                    y: current.y,
                    width: current.width,
                    height: current.height,
                    focused: current.focused,
                });
            }
        }
        snapshot
    }
}
