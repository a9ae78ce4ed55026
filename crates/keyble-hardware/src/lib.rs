//! Device boundary for the keyble bridge.
//!
//! This crate describes the lock as the reconciliation engine sees it: a
//! device that accepts `lock`, `unlock` and `open` commands, can be asked
//! for its status, and pushes status notifications whenever it likes. The
//! wireless transport and the pairing/session protocol live behind the
//! [`LockDevice`] trait.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Shared**: Commands take `&self`, so one device can serve the engine and
//!   its in-flight command tasks at once.
//! - **Thread-safe**: The trait requires `Send + Sync` for use with Tokio.
//! - **Raw notifications**: Status codes are delivered undecoded so that
//!   unknown values can be reported rather than silently dropped.
//!
//! # Example
//!
//! ```no_run
//! use keyble_hardware::traits::LockDevice;
//! use keyble_hardware::error::Result;
//!
//! async fn watch<L: LockDevice>(lock: &L) -> Result<()> {
//!     let mut statuses = lock.subscribe();
//!     lock.request_status().await?;
//!
//!     while let Ok(notification) = statuses.recv().await {
//!         println!("status code {}", notification.code);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Mock Implementations
//!
//! [`MockLock`](mock::MockLock) simulates the lock for development and
//! testing, with a [`MockLockHandle`](mock::MockLockHandle) to script
//! failures and inject notifications.
//!
//! [`LockDevice`]: traits::LockDevice

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyLockDevice;
pub use error::{HardwareError, Result};
pub use traits::LockDevice;
pub use types::{DeviceInfo, StatusNotification};
