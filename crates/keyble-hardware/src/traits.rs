//! Lock device trait definition.
//!
//! This module defines the contract between the reconciliation engine and
//! the wireless lock. The engine never sees the transport or the pairing
//! protocol, only commands, a status request, and a stream of status
//! notifications.
//!
//! All methods use native `async fn` (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use keyble_core::LockCommand;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::types::{DeviceInfo, StatusNotification};

/// Electromechanical lock reachable over a wireless link.
///
/// Commands take `&self` so one device can be shared between the engine and
/// the background tasks that run each command. The transport is expected to
/// serialise overlapping commands on its single session.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait is NOT object-safe because `async fn` methods return opaque
/// futures. Use generic parameters, or the enum wrapper from the
/// [`devices`](crate::devices) module when a concrete type is needed (for
/// example to spawn command futures onto the runtime).
///
/// # Examples
///
/// ```no_run
/// use keyble_hardware::traits::LockDevice;
/// use keyble_hardware::error::Result;
///
/// async fn lock_now<L: LockDevice>(lock: &L) -> Result<()> {
///     lock.ensure_connected().await?;
///     lock.lock().await
/// }
/// ```
pub trait LockDevice: Send + Sync {
    /// Establish a session with the lock if none is live.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be reached.
    async fn ensure_connected(&self) -> Result<()>;

    /// Extend the bolt.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is rejected or the link fails.
    async fn lock(&self) -> Result<()>;

    /// Retract the bolt.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is rejected or the link fails.
    async fn unlock(&self) -> Result<()>;

    /// Retract the bolt and pull the latch.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is rejected or the link fails.
    async fn open(&self) -> Result<()>;

    /// Ask the lock to push a fresh status notification.
    ///
    /// Completion only means the request was sent. The answer arrives on the
    /// status subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be sent.
    async fn request_status(&self) -> Result<()>;

    /// Subscribe to status notifications.
    ///
    /// Notifications may arrive at any time, including while a command is in
    /// flight.
    fn subscribe(&self) -> broadcast::Receiver<StatusNotification>;

    /// Get device information.
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs while querying
    /// device information.
    async fn get_info(&self) -> Result<DeviceInfo>;

    /// Issue `command` through the matching method.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying command.
    async fn execute(&self, command: LockCommand) -> Result<()> {
        match command {
            LockCommand::Lock => self.lock().await,
            LockCommand::Unlock => self.unlock().await,
            LockCommand::Open => self.open().await,
        }
    }
}
