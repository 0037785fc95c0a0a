//! Lattice - layout, transaction and seat-dispatch core of a tiling
//! compositor.
//!
//! The crate models outputs and windows as nodes in an arena, lays them out
//! on pending state, and applies every change atomically through
//! transactions that wait for clients to acknowledge their new sizes. Seats
//! route pointer input through a small state machine (default, button down,
//! interactive resize).
//!
//! Rendering, protocol handling, and input devices live outside the crate and
//! talk to it through the [`View`], [`DamageSink`], and [`Clock`] traits and
//! the [`CoreEvent`] stream. The `lattice` binary drives the core with
//! simulated clients for replaying scripted sessions.

// Core modules
pub mod clock;
pub mod compositor;
pub mod constants;
pub mod damage;
pub mod error;
pub mod events;
pub mod layout;
pub mod seat;
pub mod transaction;
pub mod tree;
pub mod view;

// Outer surfaces
pub mod actor;
pub mod cli;
pub mod config;

pub use clock::{Clock, ManualClock, SystemClock};
pub use compositor::Compositor;
pub use damage::{DamageLog, DamageSink, NullDamage};
pub use error::LatticeError;
pub use events::CoreEvent;
pub use view::View;
