//! In-process client used by the replay harness and the test suite.
//!
//! A [`SimulatedView`] records every capability call into a shared
//! [`SimulatedClient`] and queues the acknowledgements a real client would
//! send, according to its [`AckPolicy`]. The event loop drains the queue
//! through [`SimulatedClient::take_pending`] and feeds the acks back into
//! the compositor.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{SurfaceInfo, View, ViewConstraints, ViewKind};
use crate::tree::Rect;

/// Shared handle to the state of a simulated client.
pub type ClientHandle = Rc<RefCell<SimulatedClient>>;

/// How a simulated client acknowledges configure requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AckPolicy {
    /// Echo the configure serial.
    #[default]
    Serial,
    /// Report the committed geometry instead of a serial.
    Geometry,
    /// Report readiness without matching anything.
    Immediate,
    /// Never answer; the transaction has to time out.
    Never,
    /// Configure synchronously and return no serial.
    Synchronous,
}

/// A configure request as received by the client.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfigureRequest {
    pub serial: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// An acknowledgement the client has not delivered yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PendingAck {
    Serial(u32),
    Geometry(Rect),
    Immediate,
}

/// Recorded state of a simulated client.
#[derive(Debug, Default)]
pub struct SimulatedClient {
    /// Every configure request, oldest first.
    pub configures: Vec<ConfigureRequest>,
    pub activated: bool,
    pub tiled: bool,
    pub resizing: bool,
    pub closed: bool,
    /// Size of the last buffer the client would commit.
    pub geometry: Rect,
    /// Size limits the client advertises.
    pub constraints: ViewConstraints,
    pending: VecDeque<PendingAck>,
    next_serial: u32,
}

impl SimulatedClient {
    /// Take every queued acknowledgement.
    pub fn take_pending(&mut self) -> Vec<PendingAck> { self.pending.drain(..).collect() }

    /// Number of acknowledgements waiting to be delivered.
    #[must_use]
    pub fn pending_len(&self) -> usize { self.pending.len() }

    /// The most recent configure request, if any.
    #[must_use]
    pub fn last_configure(&self) -> Option<&ConfigureRequest> { self.configures.last() }

    fn clamp(limit_min: f64, limit_max: f64, value: f64) -> f64 {
        let value = if limit_max > 0.0 { value.min(limit_max) } else { value };
        value.max(limit_min)
    }
}

/// A [`View`] backed by a [`SimulatedClient`].
#[derive(Debug)]
pub struct SimulatedView {
    kind: ViewKind,
    policy: AckPolicy,
    client: ClientHandle,
}

impl SimulatedView {
    /// Create a view and return the handle to its client state.
    #[must_use]
    pub fn new(kind: ViewKind, policy: AckPolicy) -> (Self, ClientHandle) {
        let client = Rc::new(RefCell::new(SimulatedClient::default()));
        (Self { kind, policy, client: Rc::clone(&client) }, client)
    }

    /// Create a view whose client advertises size limits.
    #[must_use]
    pub fn with_constraints(
        kind: ViewKind,
        policy: AckPolicy,
        constraints: ViewConstraints,
    ) -> (Self, ClientHandle) {
        let (view, client) = Self::new(kind, policy);
        client.borrow_mut().constraints = constraints;
        (view, client)
    }

    /// The acknowledgement policy of this view.
    #[must_use]
    pub const fn policy(&self) -> AckPolicy { self.policy }
}

impl View for SimulatedView {
    fn kind(&self) -> ViewKind { self.kind }

    fn configure(&mut self, content_x: f64, content_y: f64, width: f64, height: f64) -> u32 {
        let mut client = self.client.borrow_mut();
        let limits = client.constraints;
        client.geometry = Rect::new(
            0.0,
            0.0,
            SimulatedClient::clamp(limits.min_width, limits.max_width, width),
            SimulatedClient::clamp(limits.min_height, limits.max_height, height),
        );

        let serial = if self.policy == AckPolicy::Synchronous {
            0
        } else {
            client.next_serial += 1;
            client.next_serial
        };
        client.configures.push(ConfigureRequest { serial, x: content_x, y: content_y, width, height });

        let ack = match self.policy {
            AckPolicy::Serial => Some(PendingAck::Serial(serial)),
            AckPolicy::Geometry => {
                Some(PendingAck::Geometry(Rect::new(content_x, content_y, width, height)))
            }
            AckPolicy::Immediate => Some(PendingAck::Immediate),
            AckPolicy::Never | AckPolicy::Synchronous => None,
        };
        if let Some(ack) = ack {
            client.pending.push_back(ack);
        }
        serial
    }

    fn set_activated(&mut self, activated: bool) { self.client.borrow_mut().activated = activated; }

    fn set_tiled(&mut self, tiled: bool) { self.client.borrow_mut().tiled = tiled; }

    fn set_resizing(&mut self, resizing: bool) { self.client.borrow_mut().resizing = resizing; }

    fn close(&mut self) { self.client.borrow_mut().closed = true; }

    fn for_each_surface(&self, f: &mut dyn FnMut(SurfaceInfo)) {
        let geometry = self.client.borrow().geometry;
        if geometry.is_valid() {
            f(SurfaceInfo { x: 0.0, y: 0.0, width: geometry.width, height: geometry.height });
        }
    }

    fn constraints(&self) -> ViewConstraints { self.client.borrow().constraints }

    fn geometry(&self) -> Rect { self.client.borrow().geometry }
}
