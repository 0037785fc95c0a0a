//! Compositor actor: the single-threaded event loop.
//!
//! The actor owns a [`Compositor`] and processes messages sequentially. It
//! waits on two sources at once: the message channel and the deadline of the
//! head transaction. After every message it runs the end-of-batch flush and
//! feeds acknowledgements from simulated clients back into the compositor
//! until nothing is left to deliver.
//!
//! # Panic Recovery
//!
//! A panicking message handler is caught and logged, and the actor keeps
//! processing subsequent messages. State may be partially inconsistent after
//! such a panic, but one bad event does not stop the loop.
//!
//! Views are not `Send`, so the actor runs on a `LocalSet`.

mod handle;
mod messages;

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

pub use handle::{ActorError, CompositorHandle};
pub use messages::{ClientSpec, CompositorMessage, CompositorQuery, QueryResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::compositor::Compositor;
use crate::seat::SeatId;
use crate::tree::NodeId;
use crate::view::{ClientHandle, PendingAck, SimulatedView};

/// Channel buffer size for the compositor actor.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Upper bound on ack delivery rounds after one message.
const MAX_ACK_ROUNDS: usize = 64;

/// The event loop that owns the compositor.
pub struct CompositorActor {
    compositor: Compositor,
    receiver: mpsc::Receiver<CompositorMessage>,
    /// Simulated clients by window, in id order.
    clients: BTreeMap<NodeId, ClientHandle>,
}

impl CompositorActor {
    /// Create an actor and the handle that talks to it.
    #[must_use]
    pub fn new(compositor: Compositor) -> (Self, CompositorHandle) {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let actor = Self { compositor, receiver, clients: BTreeMap::new() };
        (actor, CompositorHandle::new(sender))
    }

    /// Spawn the actor on the current `LocalSet`.
    ///
    /// The join handle yields the compositor once the actor stops.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a `LocalSet`.
    #[must_use]
    pub fn spawn_local(compositor: Compositor) -> (CompositorHandle, JoinHandle<Compositor>) {
        tracing::debug!("spawning compositor actor");
        let (actor, handle) = Self::new(compositor);
        (handle, tokio::task::spawn_local(actor.run()))
    }

    /// Run the message loop until shutdown or until every handle is dropped.
    pub async fn run(mut self) -> Compositor {
        tracing::trace!("compositor actor loop starting");

        loop {
            let deadline = self.compositor.next_deadline();
            let msg = tokio::select! {
                msg = self.receiver.recv() => msg,
                () = sleep_until(deadline) => {
                    tracing::trace!("transaction deadline reached");
                    self.settle();
                    continue;
                }
            };

            let Some(msg) = msg else {
                break;
            };
            if matches!(msg, CompositorMessage::Shutdown) {
                tracing::debug!("compositor actor received shutdown message");
                return self.compositor;
            }

            let msg_name = msg.name();
            let result = catch_unwind(AssertUnwindSafe(|| {
                self.handle_message(msg);
                self.settle();
            }));

            if let Err(panic_info) = result {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());

                tracing::error!(message = msg_name, panic = %panic_msg, "compositor actor recovered from panic");
            }
        }

        tracing::debug!("compositor actor channel closed, exiting");
        self.compositor
    }

    #[allow(clippy::too_many_lines)]
    fn handle_message(&mut self, msg: CompositorMessage) {
        tracing::trace!(message = msg.name(), "handling message");
        match msg {
            CompositorMessage::AddOutput { name, width, height } => {
                self.compositor.add_output(&name, width, height);
            }
            CompositorMessage::DisableOutput { name } => {
                if let Some(output) = self.output(&name) {
                    self.compositor.disable_output(output);
                }
            }
            CompositorMessage::SetUsableArea { output, area } => {
                if let Some(output) = self.output(&output) {
                    self.compositor.set_usable_area(output, area);
                }
            }
            CompositorMessage::SetOutputLayout { output, layout } => {
                if let Some(output) = self.output(&output) {
                    self.compositor.set_output_layout(output, layout);
                }
            }

            CompositorMessage::MapWindow { output, title, client } => {
                let Some(output) = self.output(&output) else {
                    return;
                };
                let (view, handle) = match client {
                    Some(spec) => {
                        let (view, handle) =
                            SimulatedView::with_constraints(spec.kind, spec.ack, spec.constraints);
                        (Some(Box::new(view) as Box<dyn crate::view::View>), Some(handle))
                    }
                    None => (None, None),
                };
                let Some(window) = self.compositor.map_window(output, title, view) else {
                    return;
                };
                if let Some(handle) = handle {
                    self.clients.insert(window, handle);
                }
            }
            CompositorMessage::UnmapWindow { title } => {
                if let Some(window) = self.window(&title) {
                    self.compositor.unmap_window(window);
                }
            }
            CompositorMessage::MoveWindow { title, output } => {
                if let (Some(window), Some(output)) = (self.window(&title), self.output(&output)) {
                    self.compositor.move_window_to_output(window, output);
                }
            }
            CompositorMessage::CloseWindow { title } => {
                if let Some(window) = self.window(&title) {
                    self.compositor.close_window(window);
                }
            }
            CompositorMessage::AckConfigure { title } => {
                if let Some(window) = self.window(&title) {
                    self.ack_latest_configure(window);
                }
            }

            CompositorMessage::AddSeat { name } => {
                self.compositor.add_seat(name);
            }
            CompositorMessage::RemoveSeat { name } => {
                if let Some(seat) = self.seat(&name) {
                    self.compositor.remove_seat(seat);
                }
            }
            CompositorMessage::Focus { seat, title } => {
                if let (Some(seat), Some(window)) = (self.seat(&seat), self.window(&title)) {
                    self.compositor.seat_set_focus(seat, window);
                }
            }
            CompositorMessage::PointerMotion { seat, dx, dy } => {
                if let Some(seat) = self.seat(&seat) {
                    self.compositor.pointer_motion(seat, dx, dy);
                }
            }
            CompositorMessage::PointerWarp { seat, x, y } => {
                if let Some(seat) = self.seat(&seat) {
                    self.compositor.pointer_motion_absolute(seat, x, y);
                }
            }
            CompositorMessage::PointerButton { seat, button, pressed, resize_modifier } => {
                if let Some(seat) = self.seat(&seat) {
                    self.compositor.pointer_button(seat, button, pressed, resize_modifier);
                }
            }
            CompositorMessage::PointerAxis { seat, axis, delta } => {
                if let Some(seat) = self.seat(&seat) {
                    self.compositor.pointer_axis(seat, axis, delta);
                }
            }
            CompositorMessage::TabletToolMotion { seat, x, y } => {
                if let Some(seat) = self.seat(&seat) {
                    self.compositor.tablet_tool_motion(seat, x, y);
                }
            }
            CompositorMessage::TabletToolTip { seat, down } => {
                if let Some(seat) = self.seat(&seat) {
                    self.compositor.tablet_tool_tip(seat, down);
                }
            }

            CompositorMessage::Query { query, respond_to } => {
                let result = match query {
                    CompositorQuery::Layout => QueryResult::Layout(self.compositor.snapshot()),
                    CompositorQuery::Idle => QueryResult::Idle(self.compositor.is_idle()),
                };
                if respond_to.send(result).is_err() {
                    tracing::debug!("query requester went away");
                }
            }

            // Handled by the loop.
            CompositorMessage::Shutdown => {}
        }
    }

    // ========================================================================
    // Client acknowledgements
    // ========================================================================

    /// Flush, then deliver queued client acks until the queue settles.
    fn settle(&mut self) {
        self.compositor.flush();
        for _ in 0..MAX_ACK_ROUNDS {
            if self.deliver_acks() == 0 {
                return;
            }
            self.compositor.flush();
        }
        tracing::warn!(rounds = MAX_ACK_ROUNDS, "client acknowledgements did not settle");
    }

    /// Feed every queued acknowledgement into the compositor.
    fn deliver_acks(&mut self) -> usize {
        self.clients.retain(|&window, _| self.compositor.nodes().contains(window));

        let mut delivered = 0;
        for (&window, client) in &self.clients {
            let pending = client.borrow_mut().take_pending();
            for ack in pending {
                delivered += 1;
                let matched = match ack {
                    PendingAck::Serial(serial) => self.compositor.notify_ready_by_serial(window, serial),
                    PendingAck::Geometry(rect) => self
                        .compositor
                        .notify_ready_by_geometry(window, rect.x, rect.y, rect.width, rect.height),
                    PendingAck::Immediate => self.compositor.notify_ready_immediately(window),
                };
                tracing::trace!(window = %window, ?ack, matched, "delivered client ack");
            }
        }
        delivered
    }

    fn ack_latest_configure(&mut self, window: NodeId) {
        let serial = self
            .clients
            .get(&window)
            .and_then(|client| client.borrow().last_configure().map(|configure| configure.serial));
        match serial {
            Some(serial) if serial > 0 => {
                self.compositor.notify_ready_by_serial(window, serial);
            }
            _ => {
                self.compositor.notify_ready_immediately(window);
            }
        }
    }

    // ========================================================================
    // Name lookups
    // ========================================================================

    fn output(&self, name: &str) -> Option<NodeId> {
        let output = self.compositor.output_by_name(name);
        if output.is_none() {
            tracing::warn!(output = name, "unknown output");
        }
        output
    }

    fn window(&self, title: &str) -> Option<NodeId> {
        let window = self.compositor.window_by_title(title);
        if window.is_none() {
            tracing::warn!(window = title, "unknown window");
        }
        window
    }

    fn seat(&self, name: &str) -> Option<SeatId> {
        let seat = self.compositor.seat_by_name(name);
        if seat.is_none() {
            tracing::warn!(seat = name, "unknown seat");
        }
        seat
    }
}

/// Sleep until `deadline`, or forever when there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
