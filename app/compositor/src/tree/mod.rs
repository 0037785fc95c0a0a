//! Node tree: outputs, windows, and the arena that owns them.

mod geometry;
mod node;
mod output;
mod store;
mod window;

pub use geometry::{Axis, Edges, Rect, ResizeTarget, SplitLayout};
pub use node::{InstructionRef, Node, NodeId, NodeKind, NodeType};
pub use output::{Output, OutputState, WindowList};
pub use store::NodeStore;
pub use window::{BorderStyle, OutputIdList, Window, WindowState};
