//! Transaction lifecycle: build, commit, readiness, apply, teardown.

use std::time::{Duration, Instant};

use super::{Instruction, InstructionState, Transaction, TxnId};
use crate::compositor::Compositor;
use crate::constants::timing;
use crate::events::CoreEvent;
use crate::tree::{InstructionRef, NodeId, NodeKind, OutputIdList, Rect, Window, WindowState};

impl Compositor {
    // ========================================================================
    // Building
    // ========================================================================

    /// Drain the dirty list into a new transaction.
    ///
    /// The transaction is committed immediately when nothing else is queued.
    /// Requests made while a transaction is being applied are deferred to
    /// the next [`flush`](Self::flush).
    pub fn commit_dirty(&mut self) {
        if self.txns.applying {
            return;
        }
        if self.txns.dirty_nodes.is_empty() {
            return;
        }

        let dirty = std::mem::take(&mut self.txns.dirty_nodes);
        let id = self.txns.next_id();
        let mut txn = Transaction::new(id, self.clock.now());
        for node in dirty {
            self.add_node(&mut txn, node, true);
        }

        if txn.instructions.is_empty() {
            return;
        }

        tracing::debug!(txn = %id, instructions = txn.instructions.len(), "transaction created");
        self.txns.queue.push_back(txn);
        if self.txns.queue.len() == 1 {
            self.commit_head();
            self.progress_queue();
        }
    }

    /// Capture a node's pending state into `txn`.
    fn add_node(&mut self, txn: &mut Transaction, id: NodeId, server_request: bool) {
        let Some(node) = self.nodes.get_mut(id) else {
            tracing::debug!(node = %id, "dirty node no longer exists");
            return;
        };
        node.dirty = false;

        let state = match &node.kind {
            NodeKind::Output(output) => InstructionState::Output(output.pending_state()),
            NodeKind::Window(window) => InstructionState::Window(window.pending_state()),
        };

        let existing = if node.txn_ref_count > 0 { txn.instruction_index(id) } else { None };
        if let Some(index) = existing {
            let instruction = &mut txn.instructions[index];
            instruction.state = state;
            instruction.server_request |= server_request;
            return;
        }

        node.txn_ref_count += 1;
        txn.instructions.push(Instruction::new(id, state, server_request));
    }

    // ========================================================================
    // Commit
    // ========================================================================

    /// Configure clients for the head transaction and arm its timer.
    fn commit_head(&mut self) {
        let Some(mut txn) = self.txns.queue.pop_front() else {
            return;
        };
        if txn.is_committed() {
            self.txns.queue.push_front(txn);
            return;
        }

        let now = self.clock.now();
        for (index, instruction) in txn.instructions.iter_mut().enumerate() {
            let hidden = self.is_hidden(instruction);
            let Some(node) = self.nodes.get_mut(instruction.node) else {
                continue;
            };
            node.instruction = Some(InstructionRef { txn: txn.id, index });
            let destroying = node.destroying;

            let (NodeKind::Window(window), InstructionState::Window(state)) =
                (&mut node.kind, &instruction.state)
            else {
                continue;
            };

            if should_configure(window, destroying, state) {
                let serial = window.view.as_deref_mut().map_or(0, |view| {
                    view.configure(state.content_x, state.content_y, state.content_width, state.content_height)
                });
                if serial == 0 {
                    instruction.ready_at = Some(now);
                } else {
                    instruction.serial = Some(serial);
                    if !hidden {
                        instruction.waiting = true;
                        txn.num_waiting += 1;
                    }
                }
            }

            if !hidden && window.view.is_some() && window.saved_buffer.is_none() {
                window.saved_buffer = Some(window.current.content_rect());
            }
        }

        txn.num_configures = txn.num_waiting;
        if self.config.debug.noatomic {
            txn.num_waiting = 0;
        } else if self.config.debug.txn_wait {
            // Phantom instruction: the transaction always runs into its timeout.
            txn.num_waiting += 1;
        }

        txn.commit_time = Some(now);
        if txn.num_waiting > 0 {
            let timeout = Duration::from_millis(self.config.txn_timeout_ms);
            match now.checked_add(timeout).filter(|_| !timeout.is_zero()) {
                Some(deadline) => txn.deadline = Some(deadline),
                None => {
                    tracing::warn!(txn = %txn.id, timeout_ms = self.config.txn_timeout_ms, "unable to arm transaction timer, applying immediately");
                    txn.num_waiting = 0;
                }
            }
        }

        tracing::debug!(
            txn = %txn.id,
            instructions = txn.instructions.len(),
            configures = txn.num_configures,
            waiting = txn.num_waiting,
            "transaction committed"
        );
        self.txns.queue.push_front(txn);
    }

    /// Whether a window instruction targets a view nobody can see.
    fn is_hidden(&self, instruction: &Instruction) -> bool {
        let Some(state) = instruction.window_state() else {
            return false;
        };
        if self.nodes.get(instruction.node).is_some_and(|node| node.destroying) {
            return false;
        }
        state.output.and_then(|output| self.nodes.output(output)).is_none_or(|output| !output.enabled)
    }

    // ========================================================================
    // Readiness
    // ========================================================================

    /// A client acknowledged the configure with `serial`.
    ///
    /// Returns whether the acknowledgement matched an in-flight instruction.
    pub fn notify_ready_by_serial(&mut self, window: NodeId, serial: u32) -> bool {
        let Some((instruction_ref, instruction)) = self.in_flight_instruction(window) else {
            return false;
        };
        if instruction.serial != Some(serial) {
            tracing::trace!(window = %window, serial, expected = ?instruction.serial, "serial does not match");
            return false;
        }
        self.set_instruction_ready(instruction_ref);
        true
    }

    /// A client committed a buffer with the given geometry.
    ///
    /// Used by clients that do not echo serials. Returns whether the
    /// geometry matched the in-flight instruction.
    pub fn notify_ready_by_geometry(
        &mut self,
        window: NodeId,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> bool {
        let Some((instruction_ref, instruction)) = self.in_flight_instruction(window) else {
            return false;
        };
        let Some(state) = instruction.window_state() else {
            return false;
        };

        #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
        let matches = x as i32 == state.content_x as i32
            && y as i32 == state.content_y as i32
            && width == state.content_width
            && height == state.content_height;
        if !matches {
            return false;
        }
        self.set_instruction_ready(instruction_ref);
        true
    }

    /// Mark a window ready without matching anything.
    pub fn notify_ready_immediately(&mut self, window: NodeId) -> bool {
        let Some((instruction_ref, _)) = self.in_flight_instruction(window) else {
            return false;
        };
        self.set_instruction_ready(instruction_ref);
        true
    }

    fn in_flight_instruction(&self, node: NodeId) -> Option<(InstructionRef, &Instruction)> {
        let instruction_ref = self.nodes.get(node)?.instruction?;
        let txn = self.txns.iter().find(|txn| txn.id == instruction_ref.txn)?;
        let instruction = txn.instructions.get(instruction_ref.index)?;
        Some((instruction_ref, instruction))
    }

    fn set_instruction_ready(&mut self, instruction_ref: InstructionRef) {
        let now = self.clock.now();
        let timings = self.config.debug.txn_timings;
        let Some(txn) = self.txns.find_mut(instruction_ref.txn) else {
            return;
        };
        let Some(instruction) = txn.instructions.get_mut(instruction_ref.index) else {
            return;
        };

        if timings && let Some(commit_time) = txn.commit_time {
            tracing::debug!(
                txn = %txn.id,
                node = %instruction.node,
                ready_ms = now.saturating_duration_since(commit_time).as_millis(),
                "instruction ready"
            );
        }

        instruction.ready_at = Some(now);
        let node = instruction.node;
        // A timed-out transaction already has num_waiting == 0.
        if instruction.waiting && txn.num_waiting > 0 {
            txn.num_waiting -= 1;
            if txn.num_waiting == 0 {
                tracing::debug!(txn = %txn.id, "transaction is ready");
                txn.deadline = None;
            }
        }
        instruction.waiting = false;

        if let Some(node) = self.nodes.get_mut(node) {
            node.instruction = None;
        }
        self.progress_queue();
    }

    /// Fire the head transaction's timer if its deadline has passed.
    pub fn handle_timeouts(&mut self) {
        let now = self.clock.now();
        let Some(head) = self.txns.queue.front_mut() else {
            return;
        };
        let Some(deadline) = head.deadline else {
            return;
        };
        if now < deadline || head.num_waiting == 0 {
            return;
        }

        tracing::debug!(txn = %head.id, waiting = head.num_waiting, "transaction timed out");
        head.num_waiting = 0;
        head.deadline = None;
        self.progress_queue();
    }

    // ========================================================================
    // Progress
    // ========================================================================

    /// Apply ready transactions from the head of the queue.
    pub(crate) fn progress_queue(&mut self) {
        if self.txns.applying {
            return;
        }
        loop {
            let Some(head) = self.txns.queue.front() else {
                return;
            };
            if !head.is_committed() {
                self.commit_head();
                continue;
            }
            if head.num_waiting > 0 {
                return;
            }

            let Some(txn) = self.txns.queue.pop_front() else {
                return;
            };
            self.apply(&txn);
            self.destroy(txn);

            // A later transaction over the same node set makes the head
            // redundant, wherever it sits in the queue.
            while self.txns.head_is_superseded() {
                let Some(stale) = self.txns.queue.pop_front() else {
                    break;
                };
                tracing::debug!(txn = %stale.id, "dropping superseded transaction");
                self.destroy(stale);
            }
        }
    }

    // ========================================================================
    // Apply
    // ========================================================================

    fn apply(&mut self, txn: &Transaction) {
        self.txns.applying = true;
        let now = self.clock.now();

        if self.config.debug.txn_timings {
            let waited = txn.commit_time.map(|commit| now.saturating_duration_since(commit));
            let waited_ms = waited.map_or(0.0, |waited| waited.as_secs_f64() * 1000.0);
            tracing::debug!(
                txn = %txn.id,
                created_to_commit_ms = txn.commit_time.map(|commit| commit.saturating_duration_since(txn.create_time).as_millis()),
                waited_ms,
                frames = waited_ms / timing::NOMINAL_FRAME_MS,
                "transaction timings"
            );
        }

        for instruction in &txn.instructions {
            self.apply_instruction(txn.id, instruction);
        }

        let output_boxes = self.current_output_boxes();
        for instruction in &txn.instructions {
            if instruction.window_state().is_some() {
                self.discover_outputs(instruction.node, &output_boxes);
            }
        }

        self.txns.applying = false;
        tracing::debug!(txn = %txn.id, "transaction applied");

        for seat in self.seat_ids() {
            self.seatop_rebase(seat);
        }

        let waited_ms = txn
            .commit_time
            .map_or(0, |commit| u64::try_from(now.saturating_duration_since(commit).as_millis()).unwrap_or(u64::MAX));
        self.events.emit(CoreEvent::TransactionApplied {
            txn: txn.id,
            nodes: txn.instructions.len(),
            waited_ms,
        });
    }

    fn apply_instruction(&mut self, txn: TxnId, instruction: &Instruction) {
        let Some(node) = self.nodes.get_mut(instruction.node) else {
            return;
        };
        let id = node.id;
        let destroying = node.destroying;
        let shared = node.txn_ref_count > 1;
        if node.instruction.is_some_and(|r| r.txn == txn) {
            node.instruction = None;
        }

        match (&mut node.kind, &instruction.state) {
            (NodeKind::Output(output), InstructionState::Output(state)) => {
                self.damage.damage_whole(id, output.current.layout_box);
                output.current = state.clone();
                self.damage.damage_whole(id, output.current.layout_box);
            }
            (NodeKind::Window(window), InstructionState::Window(state)) => {
                self.damage.damage_whole(id, window.current.box_rect());
                if let Some(saved) = window.saved_buffer {
                    self.damage.damage_box(saved);
                }

                window.current = *state;

                if !destroying || !shared {
                    window.saved_buffer = None;
                }

                center_surface(window);
                self.damage.damage_whole(id, window.current.box_rect());
                if let Some(view) = window.view.as_deref() {
                    let origin_x = window.current.content_x + window.surface_x;
                    let origin_y = window.current.content_y + window.surface_y;
                    let damage = &mut self.damage;
                    view.for_each_surface(&mut |surface| {
                        damage.damage_box(Rect::new(
                            origin_x + surface.x,
                            origin_y + surface.y,
                            surface.width,
                            surface.height,
                        ));
                    });
                }
            }
            _ => {
                crate::soft_assert!(false, node = %id, "instruction state does not match node type");
            }
        }
    }

    fn current_output_boxes(&self) -> Vec<(NodeId, Rect)> {
        self.outputs
            .iter()
            .filter_map(|&id| {
                let output = self.nodes.output(id)?;
                output.enabled.then_some((id, output.current.layout_box))
            })
            .collect()
    }

    /// Recompute which outputs a window's current box intersects.
    fn discover_outputs(&mut self, id: NodeId, output_boxes: &[(NodeId, Rect)]) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let destroying = node.destroying;
        let Some(window) = node.as_window_mut() else {
            return;
        };

        let window_box = window.current.box_rect();
        let now_on: OutputIdList = if destroying {
            OutputIdList::new()
        } else {
            output_boxes
                .iter()
                .filter(|(_, rect)| window_box.is_valid() && rect.intersects(&window_box))
                .map(|&(output, _)| output)
                .collect()
        };

        let left: Vec<NodeId> = window.outputs.iter().copied().filter(|o| !now_on.contains(o)).collect();
        let entered: Vec<NodeId> = now_on.iter().copied().filter(|o| !window.outputs.contains(o)).collect();
        window.outputs = now_on;

        for output in left {
            self.events.emit(CoreEvent::OutputLeave { window: id, output });
        }
        for output in entered {
            self.events.emit(CoreEvent::OutputEnter { window: id, output });
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Drop a transaction's node references, freeing destroyed nodes.
    fn destroy(&mut self, txn: Transaction) {
        for instruction in txn.instructions {
            let Some(node) = self.nodes.get_mut(instruction.node) else {
                continue;
            };
            node.txn_ref_count = node.txn_ref_count.saturating_sub(1);
            if node.instruction.is_some_and(|r| r.txn == txn.id) {
                node.instruction = None;
            }
            if node.is_freeable() {
                self.free_node(instruction.node);
            }
        }
    }

    fn free_node(&mut self, id: NodeId) {
        if self.nodes.remove(id).is_none() {
            return;
        }
        self.txns.forget_dirty(id);
        self.outputs.retain(|&output| output != id);
        for seat in &mut self.seats {
            seat.forget(id);
        }
        tracing::debug!(node = %id, "node freed");
        self.events.emit(CoreEvent::NodeFreed { node: id });
    }

    /// Instant of the next transaction deadline, if one is armed.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> { self.txns.next_deadline() }
}

/// Whether committing `state` requires a client configure.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn should_configure(window: &Window, destroying: bool, state: &WindowState) -> bool {
    if destroying {
        return false;
    }
    let Some(view) = window.view.as_deref() else {
        return false;
    };
    let current = &window.current;

    if view.kind().is_position_aware()
        && (state.content_x as i32 != current.content_x as i32
            || state.content_y as i32 != current.content_y as i32)
    {
        return true;
    }

    let unchanged = state.content_width == current.content_width
        && state.content_height == current.content_height;
    !unchanged
}

/// Center the client surface when it is smaller than its content box.
fn center_surface(window: &mut Window) {
    let Some(view) = window.view.as_deref() else {
        return;
    };
    let geometry = view.geometry();
    if !geometry.is_valid() {
        window.surface_x = 0.0;
        window.surface_y = 0.0;
        return;
    }

    let content = window.current.content_rect();
    window.surface_x =
        if geometry.width < content.width { ((content.width - geometry.width) / 2.0).trunc() } else { 0.0 };
    window.surface_y =
        if geometry.height < content.height { ((content.height - geometry.height) / 2.0).trunc() } else { 0.0 };
}
