//! Mock lock implementation for testing and development.
//!
//! This module provides a simulated lock that records the commands it
//! receives and can be scripted to fail, report statuses, or take time to
//! answer, without requiring physical hardware.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use keyble_core::{DeviceStatus, LockCommand};
use tokio::sync::broadcast;
use tracing::trace;

use crate::{
    HardwareError, Result,
    traits::LockDevice,
    types::{DeviceInfo, StatusNotification},
};

/// Capacity of the simulated status notification channel.
const STATUS_CHANNEL_CAPACITY: usize = 64;

/// Scriptable state behind a mock lock and its handles.
#[derive(Debug)]
struct MockLockState {
    /// Session currently established.
    connected: bool,

    /// Refuse new sessions.
    connect_fails: bool,

    /// Status the lock believes it is in.
    status: DeviceStatus,

    /// Every command received, in order.
    commands: Vec<LockCommand>,

    /// Failure messages consumed by the next commands.
    command_failures: VecDeque<String>,

    /// Number of upcoming status requests that fail.
    status_request_failures: usize,

    /// Status requests received (including failed ones).
    status_requests: usize,

    /// Sessions established.
    connects: usize,

    /// Push `Moving` and the final status after each successful command.
    auto_report: bool,

    /// Simulated command round-trip time.
    command_latency: Duration,
}

#[derive(Debug)]
struct MockLockShared {
    name: String,
    state: Mutex<MockLockState>,
    status_tx: broadcast::Sender<StatusNotification>,
}

impl MockLockShared {
    fn state(&self) -> MutexGuard<'_, MockLockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a raw status code to every subscriber.
    fn broadcast(&self, code: u8) -> usize {
        match self.status_tx.send(StatusNotification::new(code)) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("{}: status {} dropped, no subscribers", self.name, code);
                0
            }
        }
    }
}

/// Mock lock device for testing and development.
///
/// Starts disconnected and `Locked`. Commands require a session, so callers
/// must go through [`LockDevice::ensure_connected`] first, as they would with
/// the real lock.
///
/// # Examples
///
/// ```
/// use keyble_hardware::mock::MockLock;
/// use keyble_hardware::traits::LockDevice;
/// use keyble_core::{DeviceStatus, LockCommand};
///
/// #[tokio::main]
/// async fn main() -> keyble_hardware::Result<()> {
///     let (lock, handle) = MockLock::new();
///     let mut statuses = lock.subscribe();
///
///     lock.ensure_connected().await?;
///     lock.unlock().await?;
///
///     assert_eq!(handle.commands(), vec![LockCommand::Unlock]);
///     assert_eq!(statuses.recv().await.unwrap().status().unwrap(), DeviceStatus::Moving);
///     assert_eq!(statuses.recv().await.unwrap().status().unwrap(), DeviceStatus::Unlocked);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockLock {
    shared: Arc<MockLockShared>,
}

impl MockLock {
    /// Create a new mock lock with the default name.
    ///
    /// Returns a tuple of (MockLock, MockLockHandle) where the handle
    /// can be used to script and inspect the lock.
    ///
    /// # Examples
    ///
    /// ```
    /// use keyble_hardware::mock::MockLock;
    ///
    /// let (lock, handle) = MockLock::new();
    /// ```
    pub fn new() -> (Self, MockLockHandle) {
        Self::with_name("Mock Lock".to_string())
    }

    /// Create a new mock lock with a custom name.
    pub fn with_name(name: String) -> (Self, MockLockHandle) {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);

        let shared = Arc::new(MockLockShared {
            name,
            state: Mutex::new(MockLockState {
                connected: false,
                connect_fails: false,
                status: DeviceStatus::Locked,
                commands: Vec::new(),
                command_failures: VecDeque::new(),
                status_request_failures: 0,
                status_requests: 0,
                connects: 0,
                auto_report: true,
                command_latency: Duration::ZERO,
            }),
            status_tx,
        });

        let handle = MockLockHandle {
            shared: Arc::clone(&shared),
        };

        (Self { shared }, handle)
    }

    async fn run_command(&self, command: LockCommand) -> Result<()> {
        let latency = {
            let mut state = self.shared.state();
            state.commands.push(command);
            state.command_latency
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let auto_report = {
            let mut state = self.shared.state();
            if !state.connected {
                return Err(HardwareError::not_connected(self.shared.name.clone()));
            }
            if let Some(message) = state.command_failures.pop_front() {
                return Err(HardwareError::command_rejected(command.name(), message));
            }
            state.status = command.expected_status();
            state.auto_report
        };

        if auto_report {
            self.shared.broadcast(DeviceStatus::Moving.code());
            self.shared.broadcast(command.expected_status().code());
        }

        Ok(())
    }
}

impl Default for MockLock {
    fn default() -> Self {
        Self::new().0
    }
}

impl LockDevice for MockLock {
    async fn ensure_connected(&self) -> Result<()> {
        let mut state = self.shared.state();
        if state.connected {
            return Ok(());
        }
        if state.connect_fails {
            return Err(HardwareError::disconnected(self.shared.name.clone()));
        }
        state.connected = true;
        state.connects += 1;
        Ok(())
    }

    async fn lock(&self) -> Result<()> {
        self.run_command(LockCommand::Lock).await
    }

    async fn unlock(&self) -> Result<()> {
        self.run_command(LockCommand::Unlock).await
    }

    async fn open(&self) -> Result<()> {
        self.run_command(LockCommand::Open).await
    }

    async fn request_status(&self) -> Result<()> {
        let status = {
            let mut state = self.shared.state();
            state.status_requests += 1;
            if state.status_request_failures > 0 {
                state.status_request_failures -= 1;
                return Err(HardwareError::communication("status request failed"));
            }
            state.status
        };

        self.shared.broadcast(status.code());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StatusNotification> {
        self.shared.status_tx.subscribe()
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.shared.name.clone(), "Mock Lock v1.0")
            .with_firmware_version("1.0.0"))
    }
}

/// Handle for scripting and inspecting a mock lock.
///
/// Clones share the same lock.
///
/// # Examples
///
/// ```
/// use keyble_hardware::mock::MockLock;
/// use keyble_hardware::traits::LockDevice;
///
/// #[tokio::main]
/// async fn main() {
///     let (lock, handle) = MockLock::new();
///     handle.fail_next_command("motor blocked");
///
///     lock.ensure_connected().await.unwrap();
///     assert!(lock.lock().await.is_err());
///     assert!(lock.lock().await.is_ok());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockLockHandle {
    shared: Arc<MockLockShared>,
}

impl MockLockHandle {
    /// Push a status notification as if the lock reported it.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is subscribed.
    pub fn notify(&self, status: DeviceStatus) -> Result<()> {
        self.shared.state().status = status;
        self.notify_code(status.code())
    }

    /// Push a raw status code, including codes the model does not know.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is subscribed.
    pub fn notify_code(&self, code: u8) -> Result<()> {
        if self.shared.broadcast(code) == 0 {
            return Err(HardwareError::other(format!(
                "{}: no status subscribers",
                self.shared.name
            )));
        }
        Ok(())
    }

    /// Make the next command fail with `message`.
    ///
    /// Calls queue up, one failure per command.
    pub fn fail_next_command(&self, message: impl Into<String>) {
        self.shared
            .state()
            .command_failures
            .push_back(message.into());
    }

    /// Make the next `count` status requests fail.
    pub fn fail_status_requests(&self, count: usize) {
        self.shared.state().status_request_failures = count;
    }

    /// Refuse (or accept again) new sessions.
    pub fn set_connect_fails(&self, fails: bool) {
        self.shared.state().connect_fails = fails;
    }

    /// Enable or disable automatic status reports after successful commands.
    pub fn set_auto_report(&self, enabled: bool) {
        self.shared.state().auto_report = enabled;
    }

    /// Delay every command by `latency` before it completes.
    pub fn set_command_latency(&self, latency: Duration) {
        self.shared.state().command_latency = latency;
    }

    /// Set the status returned by the next status request without notifying.
    pub fn set_status(&self, status: DeviceStatus) {
        self.shared.state().status = status;
    }

    /// Drop the current session.
    pub fn disconnect(&self) {
        self.shared.state().connected = false;
    }

    /// Check if a session is established.
    pub fn is_connected(&self) -> bool {
        self.shared.state().connected
    }

    /// Status the lock believes it is in.
    pub fn status(&self) -> DeviceStatus {
        self.shared.state().status
    }

    /// Commands received so far, in order.
    pub fn commands(&self) -> Vec<LockCommand> {
        self.shared.state().commands.clone()
    }

    /// Number of commands received so far.
    pub fn command_count(&self) -> usize {
        self.shared.state().commands.len()
    }

    /// Number of status requests received so far.
    pub fn status_request_count(&self) -> usize {
        self.shared.state().status_requests
    }

    /// Number of sessions established so far.
    pub fn connect_count(&self) -> usize {
        self.shared.state().connects
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}
