//! Command translator.
//!
//! Turns a requested target into at most one physical command. The request is
//! recorded optimistically in the store before the command is sent; the
//! command itself runs off the engine task so the host write is acknowledged
//! straight away.

use std::sync::Arc;

use keyble_core::{LockCommand, Position, PositionState};
use keyble_hardware::{AnyLockDevice, LockDevice};
use tracing::{debug, info};

use crate::state::{Confirmation, PositionStateStore};

/// A command accepted for sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommand {
    /// Command sent to the lock.
    pub command: LockCommand,

    /// Target that produced the command.
    pub requested: Position,

    /// Store confirmation marker at the time the command was issued.
    pub issued_at: Confirmation,
}

/// A command that has finished, successfully or not.
#[derive(Debug)]
pub struct CommandOutcome {
    pub pending: PendingCommand,
    pub result: keyble_hardware::Result<()>,
}

/// Record `requested` and decide which command, if any, to send.
///
/// Returns `None` when `requested` equals the current target. Otherwise the
/// target and an optimistic movement are written and the state after the
/// write is returned alongside the command.
pub fn plan(
    name: &str,
    store: &mut PositionStateStore,
    requested: Position,
) -> Option<(PendingCommand, PositionState)> {
    let Some(state) = store.request_target(requested) else {
        debug!("{}: target already {}, ignoring write", name, requested);
        return None;
    };

    let pending = PendingCommand {
        command: requested.command(),
        requested,
        issued_at: store.confirmation(),
    };
    info!(
        "{}: target {} requested, sending '{}' ({})",
        name, requested, pending.command, state.movement
    );
    Some((pending, state))
}

/// Send `pending` to the lock, establishing a session first if needed.
pub async fn issue(device: Arc<AnyLockDevice>, pending: PendingCommand) -> CommandOutcome {
    let result = match device.ensure_connected().await {
        Ok(()) => device.execute(pending.command).await,
        Err(e) => Err(e),
    };
    CommandOutcome { pending, result }
}

/// Apply the provisional position of a successful command.
///
/// Returns `None` if a device status confirmed since the command was issued
/// already took precedence.
pub fn complete(
    name: &str,
    store: &mut PositionStateStore,
    pending: &PendingCommand,
) -> Option<PositionState> {
    match store.confirm_command(pending.requested, pending.issued_at) {
        Some(state) => {
            debug!(
                "{}: '{}' succeeded, provisionally at {}",
                name, pending.command, state.current_position
            );
            Some(state)
        }
        None => {
            debug!(
                "{}: '{}' succeeded after the lock reported its status, keeping reported state",
                name, pending.command
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyble_core::{DeviceStatus, Movement};
    use keyble_hardware::mock::MockLock;

    #[test]
    fn test_plan_selects_command() {
        let mut store = PositionStateStore::new();

        let (pending, state) = plan("test", &mut store, Position::Open).unwrap();
        assert_eq!(pending.command, LockCommand::Open);
        assert_eq!(pending.requested, Position::Open);
        assert_eq!(state.movement, Movement::Increasing);
        assert_eq!(state.current_position, Position::Lock);

        let (pending, state) = plan("test", &mut store, Position::Lock).unwrap();
        assert_eq!(pending.command, LockCommand::Lock);
        assert_eq!(state.movement, Movement::Decreasing);
    }

    #[test]
    fn test_plan_ignores_current_target() {
        let mut store = PositionStateStore::new();

        assert!(plan("test", &mut store, Position::Lock).is_none());
        assert!(plan("test", &mut store, Position::Unlock).is_some());
        assert!(plan("test", &mut store, Position::Unlock).is_none());
    }

    #[test]
    fn test_complete_respects_confirmed_status() {
        let mut store = PositionStateStore::new();
        let (pending, _) = plan("test", &mut store, Position::Unlock).unwrap();

        store.apply_status(DeviceStatus::Unlocked);

        assert!(complete("test", &mut store, &pending).is_none());
        assert_eq!(store.snapshot(), PositionState::stopped_at(Position::Unlock));
    }

    #[tokio::test]
    async fn test_issue_connects_then_sends() {
        let (lock, handle) = MockLock::new();
        let device = Arc::new(AnyLockDevice::Mock(lock));
        let mut store = PositionStateStore::new();
        let (pending, _) = plan("test", &mut store, Position::Unlock).unwrap();

        let outcome = issue(device, pending).await;

        assert!(outcome.result.is_ok());
        assert_eq!(handle.connect_count(), 1);
        assert_eq!(handle.commands(), vec![LockCommand::Unlock]);
    }

    #[tokio::test]
    async fn test_issue_reports_connect_failure() {
        let (lock, handle) = MockLock::new();
        handle.set_connect_fails(true);
        let device = Arc::new(AnyLockDevice::Mock(lock));
        let mut store = PositionStateStore::new();
        let (pending, _) = plan("test", &mut store, Position::Open).unwrap();

        let outcome = issue(device, pending).await;

        assert!(outcome.result.is_err());
        assert_eq!(handle.command_count(), 0);
    }
}
