//! Enum wrapper for lock device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn LockDevice>`
//! is not available. [`AnyLockDevice`] gives the engine a concrete type whose
//! command futures are known to be `Send`, which is what lets them be
//! spawned onto the runtime.
//!
//! # Examples
//!
//! ```
//! use keyble_hardware::devices::AnyLockDevice;
//! use keyble_hardware::mock::MockLock;
//!
//! let (lock, _handle) = MockLock::new();
//! let any_lock = AnyLockDevice::Mock(lock);
//! ```

use keyble_core::LockCommand;
use tokio::sync::broadcast;

use crate::mock::MockLock;
use crate::traits::LockDevice;
use crate::{DeviceInfo, Result, StatusNotification};

/// Enum wrapper for lock device dispatch.
///
/// # Examples
///
/// ```
/// use keyble_hardware::devices::AnyLockDevice;
/// use keyble_hardware::traits::LockDevice;
/// use keyble_hardware::mock::MockLock;
///
/// #[tokio::main]
/// async fn main() -> keyble_hardware::Result<()> {
///     let (lock, _handle) = MockLock::new();
///     let any_lock = AnyLockDevice::Mock(lock);
///
///     let info = any_lock.get_info().await?;
///     println!("Lock: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyLockDevice {
    /// Simulated lock for development and testing.
    Mock(MockLock),
}

impl LockDevice for AnyLockDevice {
    async fn ensure_connected(&self) -> Result<()> {
        match self {
            Self::Mock(device) => device.ensure_connected().await,
        }
    }

    async fn lock(&self) -> Result<()> {
        match self {
            Self::Mock(device) => device.lock().await,
        }
    }

    async fn unlock(&self) -> Result<()> {
        match self {
            Self::Mock(device) => device.unlock().await,
        }
    }

    async fn open(&self) -> Result<()> {
        match self {
            Self::Mock(device) => device.open().await,
        }
    }

    async fn request_status(&self) -> Result<()> {
        match self {
            Self::Mock(device) => device.request_status().await,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StatusNotification> {
        match self {
            Self::Mock(device) => device.subscribe(),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }

    async fn execute(&self, command: LockCommand) -> Result<()> {
        match command {
            LockCommand::Lock => self.lock().await,
            LockCommand::Unlock => self.unlock().await,
            LockCommand::Open => self.open().await,
        }
    }
}

impl From<MockLock> for AnyLockDevice {
    fn from(device: MockLock) -> Self {
        Self::Mock(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyble_core::DeviceStatus;

    #[tokio::test]
    async fn test_any_lock_dispatches_to_mock() {
        let (lock, handle) = MockLock::new();
        let device = AnyLockDevice::from(lock);

        device.ensure_connected().await.unwrap();
        device.execute(LockCommand::Unlock).await.unwrap();
        device.execute(LockCommand::Lock).await.unwrap();

        assert_eq!(
            handle.commands(),
            vec![LockCommand::Unlock, LockCommand::Lock]
        );
    }

    #[tokio::test]
    async fn test_any_lock_subscribe() {
        let (lock, handle) = MockLock::new();
        let device = AnyLockDevice::Mock(lock);

        let mut rx = device.subscribe();
        handle.notify(DeviceStatus::Moving).unwrap();

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.status().unwrap(), DeviceStatus::Moving);
    }

    #[tokio::test]
    async fn test_any_lock_get_info() {
        let (lock, _handle) = MockLock::with_name("Garage".to_string());
        let device = AnyLockDevice::Mock(lock);

        let info = device.get_info().await.unwrap();
        assert_eq!(info.name, "Garage");
    }
}
