//! Position state store.
//!
//! Two writers feed the store:
//!
//! - the command path, optimistically, when a target is requested and when
//!   the resulting command reports success;
//! - the status path, authoritatively, whenever the lock pushes a status.
//!
//! Both go through [`merge`], a pure function of `(state, event)`. The store
//! adds one precedence rule on top: a command success is discarded if the
//! lock confirmed a resting status after the command was issued. The device
//! has already spoken, and it outranks the command's guess.
//!
//! Readers get whole snapshots through a `watch` channel, so no reader ever
//! sees a half-updated triple.

use keyble_core::{DeviceStatus, Movement, Position, PositionState};
use tokio::sync::watch;

/// Input to [`merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// The host asked for a new target.
    TargetRequested(Position),

    /// The command for this target returned success.
    CommandSucceeded(Position),

    /// The lock reported its status.
    StatusReported(DeviceStatus),
}

/// Compute the state that follows `event`.
///
/// | Event | current | target | movement |
/// |-------|---------|--------|----------|
/// | `TargetRequested(p)`, `p` new | = | `p` | towards `p` from old target |
/// | `TargetRequested(p)`, `p` = target | = | = | = |
/// | `CommandSucceeded(p)` | `p` settled | = | `Stopped` |
/// | `Locked` | `Lock` | `Lock` | `Stopped` |
/// | `Unlocked`, `Opened` | `Unlock` | `Unlock` | `Stopped` |
/// | `Moving` | = | = | from target |
/// | `Unknown` | = | = | = |
///
/// `Moving` carries no direction, so it is inferred from the target: any
/// target above `Lock` counts as opening. A lock operated by hand against the
/// last requested target will therefore show the wrong direction until the
/// next resting status arrives.
#[must_use]
pub fn merge(state: PositionState, event: StateEvent) -> PositionState {
    match event {
        StateEvent::TargetRequested(requested) if requested == state.target_position => state,
        StateEvent::TargetRequested(requested) => PositionState {
            target_position: requested,
            movement: Movement::towards(state.target_position, requested),
            ..state
        },
        StateEvent::CommandSucceeded(requested) => PositionState {
            current_position: requested.settled(),
            movement: Movement::Stopped,
            ..state
        },
        StateEvent::StatusReported(DeviceStatus::Moving) => PositionState {
            movement: if state.target_position > Position::Lock {
                Movement::Increasing
            } else {
                Movement::Decreasing
            },
            ..state
        },
        StateEvent::StatusReported(status) => match status.resting_position() {
            Some(position) => PositionState::stopped_at(position),
            None => state,
        },
    }
}

/// Marker of how many resting statuses the store had seen at some point.
///
/// Taken when a command is issued and handed back when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Confirmation(u64);

/// Holder of the per-lock [`PositionState`].
///
/// Owned by a single engine task, so writes need `&mut self` and no locking.
#[derive(Debug)]
pub struct PositionStateStore {
    tx: watch::Sender<PositionState>,
    confirmations: u64,
}

impl PositionStateStore {
    /// Create a store in the default `Lock`/`Stopped` state.
    pub fn new() -> Self {
        Self::with_state(PositionState::default())
    }

    /// Create a store with an explicit initial state.
    pub fn with_state(initial: PositionState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx, confirmations: 0 }
    }

    /// Current triple.
    pub fn snapshot(&self) -> PositionState {
        *self.tx.borrow()
    }

    /// Subscribe to every change of the triple.
    pub fn subscribe(&self) -> watch::Receiver<PositionState> {
        self.tx.subscribe()
    }

    /// Marker to hand back to [`confirm_command`](Self::confirm_command).
    pub fn confirmation(&self) -> Confirmation {
        Confirmation(self.confirmations)
    }

    /// Record a requested target.
    ///
    /// Returns `None` when `requested` equals the current target, in which
    /// case nothing was written and no command should be issued.
    pub fn request_target(&mut self, requested: Position) -> Option<PositionState> {
        let state = self.snapshot();
        if state.target_position == requested {
            return None;
        }
        Some(self.write(merge(state, StateEvent::TargetRequested(requested))))
    }

    /// Record a successful command for `requested`.
    ///
    /// Returns `None` without writing if a resting status was confirmed since
    /// `issued_at`.
    pub fn confirm_command(
        &mut self,
        requested: Position,
        issued_at: Confirmation,
    ) -> Option<PositionState> {
        if self.confirmation() != issued_at {
            return None;
        }
        let state = self.snapshot();
        Some(self.write(merge(state, StateEvent::CommandSucceeded(requested))))
    }

    /// Apply a status reported by the lock.
    pub fn apply_status(&mut self, status: DeviceStatus) -> PositionState {
        if status.resting_position().is_some() {
            self.confirmations += 1;
        }
        let state = self.snapshot();
        self.write(merge(state, StateEvent::StatusReported(status)))
    }

    fn write(&self, next: PositionState) -> PositionState {
        self.tx.send_replace(next);
        next
    }
}

impl Default for PositionStateStore {
    fn default() -> Self {
        Self::new()
    }
}
