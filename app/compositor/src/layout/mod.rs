//! Layout: arrangement of outputs and windows, and tiled resizing.

mod arrange;
mod resize;

pub use arrange::{Arrangement, arrange_children};
