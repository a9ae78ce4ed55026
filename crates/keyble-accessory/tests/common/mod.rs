//! Shared helpers for accessory integration tests.

#![allow(dead_code)]

use std::time::Duration;

use keyble_accessory::{AccessoryHandle, AccessoryInformation, CharacteristicUpdate, LockAccessory};
use keyble_hardware::mock::{MockLock, MockLockHandle};

/// Upper bound for any single wait in these tests.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

pub fn information(name: &str) -> AccessoryInformation {
    AccessoryInformation {
        name: name.to_string(),
        manufacturer: "eqiva".to_string(),
        model: "eq3".to_string(),
        serial_number: "Default-Serial".to_string(),
    }
}

/// Start an accessory on a fresh mock lock without the initial status sync.
pub fn start_accessory() -> (AccessoryHandle, MockLockHandle) {
    start_with(|_| {})
}

/// Start an accessory after scripting the mock lock with `setup`.
pub fn start_with(setup: impl FnOnce(&MockLockHandle)) -> (AccessoryHandle, MockLockHandle) {
    let (lock, handle) = MockLock::with_name("Front Door".to_string());
    setup(&handle);
    let accessory = LockAccessory::new(information("Front Door"), lock)
        .sync_on_start(false)
        .start();
    (accessory, handle)
}

/// Poll `condition` until it holds or [`WAIT_TIMEOUT`] expires.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met before timeout");
}

/// Take every update already queued for the host.
pub fn drain_updates(accessory: &mut AccessoryHandle) -> Vec<CharacteristicUpdate> {
    std::iter::from_fn(|| accessory.try_next_update()).collect()
}

/// Receive exactly `count` updates, waiting for each.
pub async fn next_updates(
    accessory: &mut AccessoryHandle,
    count: usize,
) -> Vec<CharacteristicUpdate> {
    let mut updates = Vec::with_capacity(count);
    for _ in 0..count {
        let update = tokio::time::timeout(WAIT_TIMEOUT, accessory.next_update())
            .await
            .expect("timed out waiting for update")
            .expect("update channel closed");
        updates.push(update);
    }
    updates
}
