//! `lattice replay`: scripted sessions against simulated clients.
//!
//! A script is a JSON (or JSONC) object with a `steps` array. Each step is
//! tagged by `op`:
//!
//! ```jsonc
//! {
//!   "steps": [
//!     { "op": "addOutput", "name": "DP-1", "width": 1920, "height": 1080 },
//!     { "op": "mapWindow", "output": "DP-1", "title": "term", "client": { "ack": "serial" } },
//!     { "op": "pointerWarp", "x": 958, "y": 400 },
//!     { "op": "pointerButton", "button": "left", "pressed": true },
//!     { "op": "wait", "ms": 250 }
//!   ]
//! }
//! ```
//!
//! Seats default to the startup seat when a step omits `seat`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use serde::Deserialize;
use tabled::Table;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tokio::task::LocalSet;

use crate::actor::{ActorError, ClientSpec, CompositorActor, CompositorMessage};
use crate::compositor::{Compositor, LayoutSnapshot};
use crate::config::LatticeConfig;
use crate::constants::{buttons, names};
use crate::error::LatticeError;
use crate::tree::{Axis, Rect, SplitLayout};

/// A replay script.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Parse a script, allowing comments.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid script.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let stripped = json_comments::StripComments::new(text.as_bytes());
        serde_json::from_reader(stripped)
    }
}

/// Named pointer buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl ScriptButton {
    /// The input event code of the button.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Left => buttons::BTN_LEFT,
            Self::Right => buttons::BTN_RIGHT,
            Self::Middle => buttons::BTN_MIDDLE,
        }
    }
}

fn default_seat() -> String { names::DEFAULT_SEAT.to_string() }

/// One step of a replay script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ScriptStep {
    AddOutput { name: String, width: f64, height: f64 },
    DisableOutput { name: String },
    SetUsableArea { output: String, area: Rect },
    SetLayout { output: String, layout: SplitLayout },
    MapWindow {
        output: String,
        title: String,
        #[serde(default)]
        client: Option<ClientSpec>,
    },
    UnmapWindow { title: String },
    MoveWindow { title: String, output: String },
    CloseWindow { title: String },
    /// Acknowledge the latest configure of a window by hand.
    Ack { title: String },
    AddSeat { name: String },
    RemoveSeat { name: String },
    Focus {
        #[serde(default = "default_seat")]
        seat: String,
        title: String,
    },
    PointerMotion {
        #[serde(default = "default_seat")]
        seat: String,
        dx: f64,
        dy: f64,
    },
    PointerWarp {
        #[serde(default = "default_seat")]
        seat: String,
        x: f64,
        y: f64,
    },
    PointerButton {
        #[serde(default = "default_seat")]
        seat: String,
        #[serde(default)]
        button: ScriptButton,
        pressed: bool,
        /// Whether the resize modifier is held.
        #[serde(default)]
        modifier: bool,
    },
    PointerAxis {
        #[serde(default = "default_seat")]
        seat: String,
        axis: Axis,
        delta: f64,
    },
    TabletMotion {
        #[serde(default = "default_seat")]
        seat: String,
        x: f64,
        y: f64,
    },
    TabletTip {
        #[serde(default = "default_seat")]
        seat: String,
        down: bool,
    },
    /// Let the event loop run (and timers fire) for a while.
    Wait { ms: u64 },
}

impl ScriptStep {
    /// The message this step sends, or `None` for `wait`.
    #[must_use]
    pub fn into_message(self) -> Option<CompositorMessage> {
        let msg = match self {
            Self::AddOutput { name, width, height } => CompositorMessage::AddOutput { name, width, height },
            Self::DisableOutput { name } => CompositorMessage::DisableOutput { name },
            Self::SetUsableArea { output, area } => CompositorMessage::SetUsableArea { output, area },
            Self::SetLayout { output, layout } => CompositorMessage::SetOutputLayout { output, layout },
            Self::MapWindow { output, title, client } => CompositorMessage::MapWindow { output, title, client },
            Self::UnmapWindow { title } => CompositorMessage::UnmapWindow { title },
            Self::MoveWindow { title, output } => CompositorMessage::MoveWindow { title, output },
            Self::CloseWindow { title } => CompositorMessage::CloseWindow { title },
            Self::Ack { title } => CompositorMessage::AckConfigure { title },
            Self::AddSeat { name } => CompositorMessage::AddSeat { name },
            Self::RemoveSeat { name } => CompositorMessage::RemoveSeat { name },
            Self::Focus { seat, title } => CompositorMessage::Focus { seat, title },
            Self::PointerMotion { seat, dx, dy } => CompositorMessage::PointerMotion { seat, dx, dy },
            Self::PointerWarp { seat, x, y } => CompositorMessage::PointerWarp { seat, x, y },
            Self::PointerButton { seat, button, pressed, modifier } => CompositorMessage::PointerButton {
                seat,
                button: button.code(),
                pressed,
                resize_modifier: modifier,
            },
            Self::PointerAxis { seat, axis, delta } => CompositorMessage::PointerAxis { seat, axis, delta },
            Self::TabletMotion { seat, x, y } => CompositorMessage::TabletToolMotion { seat, x, y },
            Self::TabletTip { seat, down } => CompositorMessage::TabletToolTip { seat, down },
            Self::Wait { .. } => return None,
        };
        Some(msg)
    }
}

/// Run a script through a fresh compositor actor and return the final
/// applied layout.
///
/// Must be awaited inside a `LocalSet`.
///
/// # Errors
///
/// Returns an error if the actor stops before the script completes.
pub async fn replay(script: Script, config: LatticeConfig) -> Result<LayoutSnapshot, ActorError> {
    let (handle, task) = CompositorActor::spawn_local(Compositor::new(config));

    for step in script.steps {
        if let ScriptStep::Wait { ms } = step {
            tracing::debug!(ms, "waiting");
            tokio::time::sleep(Duration::from_millis(ms)).await;
            continue;
        }
        if let Some(msg) = step.into_message() {
            handle.send_async(msg).await?;
        }
    }

    let snapshot = handle.layout().await?;
    handle.shutdown().await?;
    if let Err(err) = task.await {
        tracing::warn!(error = %err, "compositor actor did not stop cleanly");
    }
    Ok(snapshot)
}

/// Execute `lattice replay`.
pub(super) fn execute(path: &Path, json: bool, config: LatticeConfig) -> Result<(), LatticeError> {
    let text = fs::read_to_string(path)?;
    let script = Script::parse(&text)?;
    tracing::debug!(path = %path.display(), steps = script.steps.len(), "replaying script");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
    let snapshot = LocalSet::new().block_on(&runtime, replay(script, config))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn print_snapshot(snapshot: &LayoutSnapshot) {
    if snapshot.outputs.is_empty() {
        println!("{}", "No outputs connected.".dimmed());
    } else {
        let table = Table::new(&snapshot.outputs)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..6)).with(Alignment::right()))
            .to_string();
        println!("{}", format!("Outputs ({})", snapshot.outputs.len()).bold());
        println!("{table}");
    }

    if snapshot.windows.is_empty() {
        println!("{}", "No windows mapped.".dimmed());
    } else {
        let table = Table::new(&snapshot.windows)
            .with(Style::rounded())
            .with(Modify::new(Columns::first()).with(Alignment::right()))
            .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
            .to_string();
        println!("{}", format!("Windows ({})", snapshot.windows.len()).bold());
        println!("{table}");
    }

    if snapshot.pending_transactions > 0 {
        println!(
            "{}",
            format!("{} transaction(s) still waiting", snapshot.pending_transactions).yellow()
        );
    }
    println!("{}", format!("{} events emitted", snapshot.events_emitted).dimmed());
}
