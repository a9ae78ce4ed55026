//! Constants shared by the lock model and the host characteristic model.
//!
//! The host sees the lock as a door whose openness is a percentage. Only three
//! levels are meaningful, so the characteristic domains are declared with a
//! step that makes every other value unreachable:
//!
//! | Level | Percent | Reachable by |
//! |-------|---------|--------------|
//! | Lock | 0 | current, target |
//! | Unlock | 50 | current, target |
//! | Open | 100 | target only |
//!
//! The current position is capped at [`POSITION_UNLOCK`] because "open" is a
//! sprung transient on the hardware. The lock latches back to unlocked.
//!
//! # Usage
//!
//! ```
//! use keyble_core::constants::*;
//!
//! assert!(CURRENT_POSITION_MAX < TARGET_POSITION_MAX);
//! assert_eq!(TARGET_POSITION_MAX % POSITION_STEP, 0);
//! ```

// ============================================================================
// Position scale
// ============================================================================

/// Percent reported for a locked bolt.
pub const POSITION_LOCK: u8 = 0;

/// Percent reported for a closed but unlocked door.
pub const POSITION_UNLOCK: u8 = 50;

/// Percent requested to pull the latch open.
pub const POSITION_OPEN: u8 = 100;

/// Smallest distinguishable position increment.
pub const POSITION_STEP: u8 = POSITION_UNLOCK - POSITION_LOCK;

/// Lower bound of both position characteristics.
pub const POSITION_MIN: u8 = POSITION_LOCK;

/// Upper bound of the current position characteristic.
pub const CURRENT_POSITION_MAX: u8 = POSITION_UNLOCK;

/// Upper bound of the target position characteristic.
pub const TARGET_POSITION_MAX: u8 = POSITION_OPEN;

// ============================================================================
// Device status codes
// ============================================================================

/// Device could not determine its own state.
pub const STATUS_UNKNOWN: u8 = 0;

/// Motor is running; direction is not reported.
pub const STATUS_MOVING: u8 = 1;

/// Bolt retracted.
pub const STATUS_UNLOCKED: u8 = 2;

/// Bolt extended.
pub const STATUS_LOCKED: u8 = 3;

/// Latch pulled (transient).
pub const STATUS_OPENED: u8 = 4;

// ============================================================================
// Host position state encoding
// ============================================================================

/// Host encoding of a closing movement.
pub const POSITION_STATE_DECREASING: u8 = 0;

/// Host encoding of an opening movement.
pub const POSITION_STATE_INCREASING: u8 = 1;

/// Host encoding of a stationary door.
pub const POSITION_STATE_STOPPED: u8 = 2;

// ============================================================================
// Accessory defaults
// ============================================================================

/// Default manufacturer shown by the host.
pub const DEFAULT_MANUFACTURER: &str = "eqiva";

/// Default model shown by the host.
pub const DEFAULT_MODEL: &str = "eq3";

/// Default serial number shown by the host.
pub const DEFAULT_SERIAL_NUMBER: &str = "Default-Serial";

/// Length of a user key in hexadecimal characters (16 bytes).
pub const USER_KEY_HEX_LENGTH: usize = 32;
