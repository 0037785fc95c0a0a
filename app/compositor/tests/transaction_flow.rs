//! End-to-end transaction behavior: dirty batching, atomic apply, client
//! acknowledgements, timeouts, coalescing, and deferred freeing.

#![allow(clippy::float_cmp)]

use std::time::Duration;

use lattice_lib::compositor::Compositor;
use lattice_lib::config::LatticeConfig;
use lattice_lib::tree::{NodeId, Rect};
use lattice_lib::view::{AckPolicy, ClientHandle, PendingAck, SimulatedView, ViewKind};
use lattice_lib::{Clock, CoreEvent, DamageLog, ManualClock};

struct Harness {
    compositor: Compositor,
    clock: ManualClock,
    damage: DamageLog,
    output: NodeId,
}

impl Harness {
    fn new(config: LatticeConfig) -> Self {
        let clock = ManualClock::new();
        let damage = DamageLog::new();
        let mut compositor =
            Compositor::with_backends(config, Box::new(damage.clone()), Box::new(clock.clone()));
        let output = compositor.add_output("DP-1", 1000.0, 500.0).unwrap();
        compositor.flush();
        assert!(compositor.is_idle());
        Self { compositor, clock, damage, output }
    }

    fn map(&mut self, title: &str, kind: ViewKind, policy: AckPolicy) -> (NodeId, ClientHandle) {
        let (view, client) = SimulatedView::new(kind, policy);
        let window = self.compositor.map_window(self.output, title, Some(Box::new(view))).unwrap();
        (window, client)
    }

    /// Deliver every queued acknowledgement of one client.
    fn ack(&mut self, window: NodeId, client: &ClientHandle) {
        let pending = client.borrow_mut().take_pending();
        for ack in pending {
            match ack {
                PendingAck::Serial(serial) => self.compositor.notify_ready_by_serial(window, serial),
                PendingAck::Geometry(rect) => self
                    .compositor
                    .notify_ready_by_geometry(window, rect.x, rect.y, rect.width, rect.height),
                PendingAck::Immediate => self.compositor.notify_ready_immediately(window),
            };
        }
    }

    fn current_width(&self, window: NodeId) -> f64 { self.compositor.window(window).unwrap().current.width }

    fn pending_width(&self, window: NodeId) -> f64 { self.compositor.window(window).unwrap().width }
}

fn config() -> LatticeConfig { LatticeConfig::default() }

mod dirty_tests {
    use super::*;

    #[test]
    fn test_mark_dirty_is_idempotent() {
        let mut h = Harness::new(config());

        h.compositor.mark_dirty(h.output);
        h.compositor.mark_dirty(h.output);

        assert_eq!(h.compositor.transactions().dirty_nodes(), &[h.output]);
        assert!(h.compositor.nodes().get(h.output).unwrap().dirty);
    }

    #[test]
    fn test_commit_with_nothing_dirty_is_a_no_op() {
        let mut h = Harness::new(config());

        h.compositor.commit_dirty();

        assert!(h.compositor.transactions().is_empty());
    }

    #[test]
    fn test_children_cover_the_output_exactly() {
        let mut h = Harness::new(config());
        let windows: Vec<NodeId> =
            ["a", "b", "c"].iter().map(|title| h.map(title, ViewKind::Shell, AckPolicy::Serial).0).collect();

        let widths: Vec<f64> = windows.iter().map(|&w| h.pending_width(w)).collect();
        assert_eq!(widths, vec![333.0, 333.0, 334.0]);
        assert_eq!(widths.iter().sum::<f64>(), 1000.0);
    }

    #[test]
    fn test_children_and_gaps_cover_the_output_exactly() {
        let mut config = config();
        config.gaps.inner = 10.0;
        let mut h = Harness::new(config);
        let windows: Vec<NodeId> =
            ["a", "b", "c"].iter().map(|title| h.map(title, ViewKind::Shell, AckPolicy::Serial).0).collect();

        let last = h.compositor.window(windows[2]).unwrap().box_rect();
        assert_eq!(last.x + last.width, 1000.0);
        let total: f64 = windows.iter().map(|&w| h.pending_width(w)).sum();
        assert_eq!(total + 20.0, 1000.0);
    }

    #[test]
    fn test_arrange_never_touches_current() {
        let mut h = Harness::new(config());
        let (a, _) = h.map("a", ViewKind::Shell, AckPolicy::Serial);

        assert_eq!(h.pending_width(a), 1000.0);
        assert_eq!(h.current_width(a), 0.0);
    }
}

mod atomic_tests {
    use super::*;

    #[test]
    fn test_siblings_apply_together() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Serial);
        h.compositor.flush();
        h.ack(a, &client_a);
        assert_eq!(h.current_width(a), 1000.0);

        let (b, client_b) = h.map("b", ViewKind::Shell, AckPolicy::Serial);
        h.compositor.flush();
        assert_eq!(h.compositor.transactions().head().unwrap().num_waiting, 2);

        h.ack(a, &client_a);
        assert_eq!(h.current_width(a), 1000.0, "a stays at its old size while b is pending");
        assert_eq!(h.current_width(b), 0.0);

        h.ack(b, &client_b);
        assert_eq!(h.current_width(a), 500.0);
        assert_eq!(h.current_width(b), 500.0);
        assert!(h.compositor.is_idle());
    }

    #[test]
    fn test_later_batch_waits_behind_the_committed_head() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Serial);
        h.compositor.flush();

        h.compositor.set_usable_area(h.output, Rect::new(0.0, 0.0, 900.0, 500.0));
        h.compositor.flush();

        let queued: Vec<bool> = h.compositor.transactions().iter().map(|txn| txn.is_committed()).collect();
        assert_eq!(queued, vec![true, false]);
        assert_eq!(client_a.borrow().configures.len(), 1);

        h.ack(a, &client_a);
        assert_eq!(h.current_width(a), 1000.0);
        assert_eq!(client_a.borrow().configures.len(), 2, "the second batch commits after the first applies");

        h.ack(a, &client_a);
        assert_eq!(h.current_width(a), 900.0);
    }

    #[test]
    fn test_apply_damages_old_and_new_footprint() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Serial);
        h.compositor.flush();
        h.ack(a, &client_a);
        let _ = h.damage.take();

        h.compositor.set_usable_area(h.output, Rect::new(0.0, 0.0, 600.0, 500.0));
        h.compositor.flush();
        assert!(h.damage.is_empty(), "nothing is damaged while the transaction waits");
        h.ack(a, &client_a);

        assert!(h.damage.contains_whole(a, Rect::new(0.0, 0.0, 1000.0, 500.0)));
        assert!(h.damage.contains_whole(a, Rect::new(0.0, 0.0, 600.0, 500.0)));
    }

    #[test]
    fn test_applied_event_reports_nodes() {
        let mut h = Harness::new(config());
        let mut events = h.compositor.subscribe();
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Serial);
        h.compositor.flush();
        h.ack(a, &client_a);

        let applied = std::iter::from_fn(|| events.try_recv().ok())
            .find_map(|event| match event {
                CoreEvent::TransactionApplied { nodes, .. } => Some(nodes),
                _ => None,
            })
            .unwrap();
        assert!(applied >= 2);
    }
}

mod readiness_tests {
    use super::*;

    #[test]
    fn test_duplicate_and_mismatched_serials_are_ignored() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Never);
        h.compositor.flush();
        let serial = client_a.borrow().last_configure().unwrap().serial;

        assert!(!h.compositor.notify_ready_by_serial(a, serial + 1));
        assert!(h.compositor.notify_ready_by_serial(a, serial));
        assert!(!h.compositor.notify_ready_by_serial(a, serial));
        assert!(h.compositor.is_idle());
    }

    #[test]
    fn test_geometry_ack_must_match_exactly() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::X11Compat, AckPolicy::Never);
        h.compositor.flush();
        let configure = *client_a.borrow().last_configure().unwrap();

        assert!(!h.compositor.notify_ready_by_geometry(
            a,
            configure.x,
            configure.y,
            configure.width - 1.0,
            configure.height
        ));
        assert!(h.compositor.notify_ready_by_geometry(
            a,
            configure.x,
            configure.y,
            configure.width,
            configure.height
        ));
        assert!(h.compositor.is_idle());
    }

    #[test]
    fn test_zero_serial_needs_no_acknowledgement() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Synchronous);

        h.compositor.flush();

        assert_eq!(client_a.borrow().configures.len(), 1);
        assert!(h.compositor.is_idle());
        assert_eq!(h.current_width(a), 1000.0);
    }

    #[test]
    fn test_position_change_configures_position_aware_views_only() {
        let mut shell = Harness::new(config());
        let (a, client_a) = shell.map("a", ViewKind::Shell, AckPolicy::Serial);
        shell.compositor.flush();
        shell.ack(a, &client_a);

        shell.compositor.set_usable_area(shell.output, Rect::new(50.0, 0.0, 1000.0, 500.0));
        shell.compositor.flush();
        assert_eq!(client_a.borrow().configures.len(), 1);
        assert!(shell.compositor.is_idle());

        let mut x11 = Harness::new(config());
        let (b, client_b) = x11.map("b", ViewKind::X11Compat, AckPolicy::Serial);
        x11.compositor.flush();
        x11.ack(b, &client_b);

        x11.compositor.set_usable_area(x11.output, Rect::new(50.0, 0.0, 1000.0, 500.0));
        x11.compositor.flush();
        assert_eq!(client_b.borrow().configures.len(), 2);
        assert!(!x11.compositor.is_idle());
    }
}

mod timeout_tests {
    use super::*;

    #[test]
    fn test_unresponsive_client_delays_at_most_the_timeout() {
        let mut h = Harness::new(config());
        let (a, _client) = h.map("a", ViewKind::Shell, AckPolicy::Never);
        h.compositor.flush();
        assert_eq!(h.compositor.next_deadline(), Some(h.clock.now() + Duration::from_millis(200)));

        h.clock.advance(Duration::from_millis(199));
        h.compositor.flush();
        assert_eq!(h.current_width(a), 0.0);

        h.clock.advance(Duration::from_millis(1));
        h.compositor.flush();
        assert_eq!(h.current_width(a), 1000.0);
        assert!(h.compositor.next_deadline().is_none());
    }

    #[test]
    fn test_late_ack_after_timeout_is_harmless() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Never);
        h.compositor.flush();
        let serial = client_a.borrow().last_configure().unwrap().serial;

        h.clock.advance(Duration::from_millis(200));
        h.compositor.flush();

        assert!(!h.compositor.notify_ready_by_serial(a, serial));
        assert!(h.compositor.is_idle());
    }

    #[test]
    fn test_zero_timeout_applies_synchronously() {
        let mut config = config();
        config.txn_timeout_ms = 0;
        let mut h = Harness::new(config);
        let (a, _client) = h.map("a", ViewKind::Shell, AckPolicy::Never);

        h.compositor.flush();

        assert!(h.compositor.is_idle());
        assert_eq!(h.current_width(a), 1000.0);
    }

    #[test]
    fn test_txn_wait_always_runs_into_the_timeout() {
        let mut config = config();
        config.debug.txn_wait = true;
        let mut h = Harness::new(config);
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Serial);
        h.compositor.flush();

        h.ack(a, &client_a);
        assert_eq!(h.current_width(a), 0.0);

        h.clock.advance(Duration::from_millis(200));
        h.compositor.flush();
        assert_eq!(h.current_width(a), 1000.0);
    }

    #[test]
    fn test_noatomic_applies_without_waiting() {
        let mut config = config();
        config.debug.noatomic = true;
        let mut h = Harness::new(config);
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Never);

        h.compositor.flush();

        assert_eq!(client_a.borrow().configures.len(), 1);
        assert!(h.compositor.is_idle());
        assert_eq!(h.current_width(a), 1000.0);
    }
}

mod queue_tests {
    use super::*;

    #[test]
    fn test_transactions_over_the_same_nodes_coalesce() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Serial);
        h.compositor.flush();
        h.ack(a, &client_a);

        for width in [900.0, 800.0, 700.0] {
            h.compositor.set_usable_area(h.output, Rect::new(0.0, 0.0, width, 500.0));
            h.compositor.commit_dirty();
        }
        let ids: Vec<_> = h.compositor.transactions().iter().map(|txn| txn.id).collect();
        assert_eq!(ids.len(), 3);

        h.ack(a, &client_a);

        let head = h.compositor.transactions().head().unwrap();
        assert_eq!(h.compositor.transactions().len(), 1);
        assert_eq!(head.id, ids[2]);
        assert!(head.is_committed());
        assert_eq!(h.current_width(a), 900.0);

        h.ack(a, &client_a);
        assert_eq!(h.current_width(a), 700.0);
        assert!(h.compositor.is_idle());
        assert_eq!(client_a.borrow().configures.len(), 3, "the dropped batch never configured");
    }

    /// A second 800x500 output holding window `b`, both outputs settled.
    fn second_output(h: &mut Harness, a: NodeId, client_a: &ClientHandle) -> (NodeId, NodeId, ClientHandle) {
        let second = h.compositor.add_output("DP-2", 800.0, 500.0).unwrap();
        let (view, client_b) = SimulatedView::new(ViewKind::Shell, AckPolicy::Serial);
        let b = h.compositor.map_window(second, "b", Some(Box::new(view))).unwrap();
        h.compositor.flush();
        for _ in 0..4 {
            h.ack(a, client_a);
            h.ack(b, &client_b);
            h.compositor.flush();
        }
        assert!(h.compositor.is_idle());
        (second, b, client_b)
    }

    fn queue_usable_width(h: &mut Harness, output: NodeId, width: f64) {
        h.compositor.set_usable_area(output, Rect::new(0.0, 0.0, width, 500.0));
        h.compositor.commit_dirty();
    }

    #[test]
    fn test_duplicate_further_back_supersedes_the_head() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Serial);
        let (second, b, client_b) = second_output(&mut h, a, &client_a);
        let configured = client_a.borrow().configures.len();
        let first = h.output;

        queue_usable_width(&mut h, first, 900.0);
        queue_usable_width(&mut h, first, 800.0);
        queue_usable_width(&mut h, second, 700.0);
        queue_usable_width(&mut h, first, 700.0);
        let ids: Vec<_> = h.compositor.transactions().iter().map(|txn| txn.id).collect();
        assert_eq!(ids.len(), 4);

        h.ack(a, &client_a);

        // The 800 batch is dropped; the other output's batch is committed.
        let queued: Vec<_> = h.compositor.transactions().iter().map(|txn| txn.id).collect();
        assert_eq!(queued, vec![ids[2], ids[3]]);
        assert_eq!(client_a.borrow().configures.len(), configured + 1);
        assert_eq!(h.current_width(a), 900.0);

        h.ack(b, &client_b);
        assert_eq!(h.current_width(b), 700.0);
        h.ack(a, &client_a);

        assert!(h.compositor.is_idle());
        assert_eq!(h.current_width(a), 700.0);
        assert_eq!(client_a.borrow().configures.len(), configured + 2);
    }

    #[test]
    fn test_head_without_later_duplicate_is_kept() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Serial);
        let (second, _b, _client_b) = second_output(&mut h, a, &client_a);
        let configured = client_a.borrow().configures.len();
        let first = h.output;

        queue_usable_width(&mut h, first, 900.0);
        queue_usable_width(&mut h, first, 800.0);
        queue_usable_width(&mut h, second, 700.0);
        let ids: Vec<_> = h.compositor.transactions().iter().map(|txn| txn.id).collect();

        h.ack(a, &client_a);

        let head = h.compositor.transactions().head().unwrap();
        assert_eq!(head.id, ids[1]);
        assert!(head.is_committed());
        assert_eq!(h.compositor.transactions().len(), 2);
        assert_eq!(client_a.borrow().configures.len(), configured + 2);
    }

    #[test]
    fn test_hidden_views_do_not_hold_the_transaction() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Never);
        h.compositor.flush();
        h.clock.advance(Duration::from_millis(200));
        h.compositor.flush();
        assert!(h.compositor.is_idle());

        assert!(h.compositor.disable_output(h.output));
        h.compositor.flush();

        assert_eq!(client_a.borrow().configures.len(), 2);
        assert!(h.compositor.is_idle());
        let fallback = h.compositor.fallback_output();
        assert_eq!(h.compositor.window(a).unwrap().current.output, Some(fallback));
        assert!(!h.compositor.nodes().contains(h.output));
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_destroyed_window_is_freed_only_after_its_transactions() {
        let mut h = Harness::new(config());
        let mut events = h.compositor.subscribe();
        let (a, _client) = h.map("a", ViewKind::Shell, AckPolicy::Never);
        h.compositor.flush();

        assert!(h.compositor.unmap_window(a));
        h.compositor.flush();

        let node = h.compositor.nodes().get(a).unwrap();
        assert!(node.destroying);
        assert_eq!(node.txn_ref_count, 2);

        h.clock.advance(Duration::from_millis(200));
        h.compositor.flush();

        assert!(!h.compositor.nodes().contains(a));
        assert!(h.compositor.is_idle());
        let freed = std::iter::from_fn(|| events.try_recv().ok())
            .any(|event| event == CoreEvent::NodeFreed { node: a });
        assert!(freed);
    }

    #[test]
    fn test_unmap_of_an_idle_window_frees_on_next_flush() {
        let mut h = Harness::new(config());
        let (a, client_a) = h.map("a", ViewKind::Shell, AckPolicy::Serial);
        let (b, client_b) = h.map("b", ViewKind::Shell, AckPolicy::Serial);
        h.compositor.flush();
        h.ack(a, &client_a);
        h.ack(b, &client_b);

        h.compositor.unmap_window(a);
        assert!(h.compositor.nodes().contains(a));
        h.compositor.flush();
        h.ack(b, &client_b);

        assert!(!h.compositor.nodes().contains(a));
        assert_eq!(h.current_width(b), 1000.0);
    }
}
