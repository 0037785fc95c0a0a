//! Application-wide constants.
//!
//! Timing defaults, minimum tile sizes, and input button codes shared by the
//! layout, transaction, and seat modules.

/// Transaction timing constants.
pub mod timing {
    /// Default time a committed transaction waits for clients, in milliseconds.
    pub const DEFAULT_TXN_TIMEOUT_MS: u64 = 200;

    /// Nominal frame time used when reporting transaction timings.
    pub const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;
}

/// Tile size limits.
pub mod sizes {
    /// Smallest width a tiled window may be resized to.
    pub const MIN_SANE_W: f64 = 100.0;

    /// Smallest height a tiled window may be resized to.
    pub const MIN_SANE_H: f64 = 60.0;

    /// Default border thickness in logical pixels.
    pub const DEFAULT_BORDER_THICKNESS: f64 = 2.0;

    /// Default titlebar height for the `normal` border style.
    pub const DEFAULT_TITLEBAR_HEIGHT: f64 = 20.0;
}

/// Linux input event button codes (`linux/input-event-codes.h`).
pub mod buttons {
    /// Primary (left) mouse button.
    pub const BTN_LEFT: u32 = 0x110;

    /// Secondary (right) mouse button.
    pub const BTN_RIGHT: u32 = 0x111;

    /// Middle mouse button.
    pub const BTN_MIDDLE: u32 = 0x112;
}

/// Names used for built-in nodes and seats.
pub mod names {
    /// Name of the disabled output that receives evacuated windows.
    pub const FALLBACK_OUTPUT: &str = "FALLBACK";

    /// Name of the seat created by default.
    pub const DEFAULT_SEAT: &str = "seat0";
}
