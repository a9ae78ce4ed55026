//! Status reconciler.
//!
//! Applies status notifications from the lock to the store. Decoded statuses
//! go through the authoritative mapping; `Unknown` and unrecognised codes leave
//! the state alone. Either way the caller republishes the resulting triple.

use keyble_core::{DeviceStatus, PositionState};
use keyble_hardware::StatusNotification;
use tracing::{debug, error, info};

use crate::state::PositionStateStore;

/// Apply `notification` and return the state to publish.
pub fn reconcile(
    name: &str,
    store: &mut PositionStateStore,
    notification: &StatusNotification,
) -> PositionState {
    match notification.status() {
        Ok(DeviceStatus::Unknown) => {
            info!("{}: lock reports status UNKNOWN", name);
            store.snapshot()
        }
        Ok(status) => {
            let state = store.apply_status(status);
            debug!("{}: status {} -> {}", name, status, state);
            state
        }
        Err(e) => {
            error!("{}: {}", name, e);
            store.snapshot()
        }
    }
}
