//! Damage reporting seam.
//!
//! The core only says which regions changed; the renderer decides what to
//! repaint.

use std::cell::RefCell;
use std::rc::Rc;

use crate::tree::{NodeId, Rect};

/// Receiver of damage notifications.
pub trait DamageSink {
    /// A node's whole footprint changed.
    fn damage_whole(&mut self, node: NodeId, rect: Rect);

    /// An arbitrary region changed.
    fn damage_box(&mut self, rect: Rect);
}

/// Discards all damage.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDamage;

impl DamageSink for NullDamage {
    fn damage_whole(&mut self, _node: NodeId, _rect: Rect) {}

    fn damage_box(&mut self, _rect: Rect) {}
}

/// A recorded damage notification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Damage {
    Whole(NodeId, Rect),
    Box(Rect),
}

/// Records damage into a shared log. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct DamageLog {
    entries: Rc<RefCell<Vec<Damage>>>,
}

impl DamageLog {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Take every recorded entry.
    #[must_use]
    pub fn take(&self) -> Vec<Damage> { self.entries.borrow_mut().drain(..).collect() }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.borrow().len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.borrow().is_empty() }

    /// Whether the whole footprint of `node` was damaged with `rect`.
    #[must_use]
    pub fn contains_whole(&self, node: NodeId, rect: Rect) -> bool {
        self.entries.borrow().iter().any(|entry| *entry == Damage::Whole(node, rect))
    }
}

impl DamageSink for DamageLog {
    fn damage_whole(&mut self, node: NodeId, rect: Rect) {
        self.entries.borrow_mut().push(Damage::Whole(node, rect));
    }

    fn damage_box(&mut self, rect: Rect) { self.entries.borrow_mut().push(Damage::Box(rect)); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_log_clones_share_entries() {
        let log = DamageLog::new();
        let mut sink: Box<dyn DamageSink> = Box::new(log.clone());

        sink.damage_whole(NodeId(1), Rect::new(0.0, 0.0, 10.0, 10.0));
        sink.damage_box(Rect::new(1.0, 1.0, 2.0, 2.0));

        assert_eq!(log.len(), 2);
        assert!(log.contains_whole(NodeId(1), Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(log.take().len(), 2);
        assert!(log.is_empty());
    }
}
