//! Reconciliation engine between an eqiva eQ-3 smart lock and a door
//! accessory.
//!
//! The lock speaks in discrete statuses (locked, unlocked, opened, moving,
//! unknown). The host models a door as a current position, a target position,
//! and a movement direction. This crate keeps the two consistent:
//!
//! - [`translator`] turns target writes into `lock`/`unlock`/`open` commands,
//!   ignoring writes that repeat the current target;
//! - [`reconciler`] maps status notifications onto the position triple;
//! - [`recovery`] asks the lock for a fresh status when a command fails;
//! - [`state`] holds the triple and decides which writer wins;
//! - [`accessory`] runs one engine task per lock and hands the host a
//!   [`AccessoryHandle`].
//!
//! Device statuses always outrank the engine's own guesses. Where the two
//! disagree the state shows what the lock last said, even if that contradicts
//! the latest request.

pub mod accessory;
pub mod characteristic;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod recovery;
pub mod state;
pub mod translator;

pub use accessory::{AccessoryHandle, LockAccessory};
pub use characteristic::{
    AccessoryInformation, Characteristic, CharacteristicProps, CharacteristicUpdate,
};
pub use config::{AccessoryConfig, BridgeConfig, LockConfig};
pub use error::{AccessoryError, Result};
pub use state::{PositionStateStore, StateEvent, merge};
