//! Error recovery after a failed command.
//!
//! A failed command says nothing reliable about where the bolt is, so the
//! state is left as it was and the lock is asked to report again. The answer
//! arrives through the normal status path.

use std::sync::Arc;

use keyble_core::LockCommand;
use keyble_hardware::{AnyLockDevice, HardwareError, LockDevice};
use tracing::{debug, error};

/// Report `failure` and request one fresh status from the lock.
///
/// The status request is not retried if it fails as well; the state then
/// stays as it is until the lock sends its next notification.
pub async fn recover(
    device: Arc<AnyLockDevice>,
    name: Arc<str>,
    command: LockCommand,
    failure: HardwareError,
) {
    error!("{}: '{}' failed: {}", name, command, failure);

    match device.request_status().await {
        Ok(()) => debug!("{}: status requested after failed '{}'", name, command),
        Err(e) => error!("{}: status request after failed '{}' also failed: {}", name, command, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyble_core::DeviceStatus;
    use keyble_hardware::mock::MockLock;

    #[tokio::test]
    async fn test_recover_requests_status_once() {
        let (lock, handle) = MockLock::new();
        let device = Arc::new(AnyLockDevice::Mock(lock));
        let mut rx = device.subscribe();
        handle.set_status(DeviceStatus::Locked);

        recover(
            device,
            Arc::from("test"),
            LockCommand::Unlock,
            HardwareError::timeout(5000),
        )
        .await;

        assert_eq!(handle.status_request_count(), 1);
        assert_eq!(rx.recv().await.unwrap().code, DeviceStatus::Locked.code());
    }

    #[tokio::test]
    async fn test_recover_does_not_retry_status_request() {
        let (lock, handle) = MockLock::new();
        handle.fail_status_requests(3);
        let device = Arc::new(AnyLockDevice::Mock(lock));

        recover(
            device,
            Arc::from("test"),
            LockCommand::Open,
            HardwareError::command_rejected("open", "jammed"),
        )
        .await;

        assert_eq!(handle.status_request_count(), 1);
    }
}
