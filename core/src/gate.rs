use serde::{Deserialize, Serialize};

use crate::*;

/// Whether the local player may issue input.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateState {
    #[default]
    Locked,
    /// The turn-swap indicator is showing, input unlocks or stays locked once it elapses.
    PendingUnlock,
    Unlocked,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct PendingSwap {
    deadline: Millis,
    resolve_to: GateState,
}

/// Turn/animation state machine gating local input.
///
/// Valid transitions:
/// - any -> Locked / Unlocked on a silent turn context (initial sync)
/// - any -> PendingUnlock on a notified turn change
/// - PendingUnlock -> Locked / Unlocked once the swap indicator elapses
///
/// While the action queue drains the reported state is forced to `Locked`, the turn state underneath keeps evolving
/// and shows through again once the queue is empty.
#[derive(Clone, Debug)]
pub struct TurnGate {
    local_player: Player,
    swap_ms: Millis,
    turn_state: GateState,
    pending: Option<PendingSwap>,
    queue_busy: bool,
    torn_down: bool,
}

impl TurnGate {
    pub fn new(local_player: Player, swap_ms: Millis) -> Self {
        Self {
            local_player,
            swap_ms,
            turn_state: GateState::Locked,
            pending: None,
            queue_busy: false,
            torn_down: false,
        }
    }

    pub fn local_player(&self) -> Player {
        self.local_player
    }

    pub fn state(&self) -> GateState {
        if self.queue_busy {
            GateState::Locked
        } else {
            self.turn_state
        }
    }

    /// The state ignoring any running animation.
    pub fn turn_state(&self) -> GateState {
        self.turn_state
    }

    pub fn is_interaction_enabled(&self) -> bool {
        self.state() == GateState::Unlocked
    }

    pub fn is_swap_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.pending.map(|pending| pending.deadline)
    }

    /// Applies a new turn context. A pending swap from an earlier context is replaced, never stacked.
    pub fn on_turn_context(&mut self, context: &TurnContext, now: Millis) {
        if self.torn_down {
            return;
        }

        let resolve_to = if !context.pre_match_start && context.is_turn_of(self.local_player) {
            GateState::Unlocked
        } else {
            GateState::Locked
        };

        if self.pending.take().is_some() {
            log::debug!("turn context replaced a pending swap");
        }

        if context.notify_turn_change && !context.pre_match_start {
            let deadline = now.saturating_add(self.swap_ms);
            log::debug!("turn swap pending until {} -> {:?}", deadline, resolve_to);
            self.pending = Some(PendingSwap {
                deadline,
                resolve_to,
            });
            self.turn_state = GateState::PendingUnlock;
        } else {
            log::debug!("turn synced -> {:?}", resolve_to);
            self.turn_state = resolve_to;
        }
    }

    pub fn set_queue_busy(&mut self, busy: bool) {
        self.queue_busy = busy;
    }

    /// Resolves the pending swap once due, returns the state it resolved to.
    pub fn poll(&mut self, now: Millis) -> Option<GateState> {
        match self.pending {
            Some(PendingSwap {
                deadline,
                resolve_to,
            }) if deadline <= now => {
                self.pending = None;
                self.turn_state = resolve_to;
                log::debug!("turn swap finished -> {:?}", resolve_to);
                Some(resolve_to)
            }
            _ => None,
        }
    }

    /// Cancels the pending swap and locks for good.
    pub fn teardown(&mut self) {
        self.pending = None;
        self.turn_state = GateState::Locked;
        self.torn_down = true;
    }
}
