use crate::{
    Result,
    constants::{
        POSITION_LOCK, POSITION_OPEN, POSITION_STATE_DECREASING, POSITION_STATE_INCREASING,
        POSITION_STATE_STOPPED, POSITION_UNLOCK, STATUS_LOCKED, STATUS_MOVING, STATUS_OPENED,
        STATUS_UNKNOWN, STATUS_UNLOCKED,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Door openness level.
///
/// Ordered from most closed to most open, so `Open > Unlock > Lock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Position {
    Lock = POSITION_LOCK,
    Unlock = POSITION_UNLOCK,
    Open = POSITION_OPEN,
}

impl Position {
    /// Map a host percentage onto a position level.
    ///
    /// `0` is `Lock`, `100` is `Open`, and every intermediate value is treated
    /// as `Unlock`.
    ///
    /// # Errors
    /// Returns `Error::InvalidPosition` for values above 100.
    pub fn from_percent(value: u8) -> Result<Self> {
        match value {
            POSITION_LOCK => Ok(Position::Lock),
            POSITION_OPEN => Ok(Position::Open),
            v if v < POSITION_OPEN => Ok(Position::Unlock),
            _ => Err(Error::InvalidPosition { value }),
        }
    }

    /// Host percentage for this level.
    #[inline]
    #[must_use]
    pub fn as_percent(self) -> u8 {
        self as u8
    }

    /// Position the mechanism can actually hold after reaching `self`.
    ///
    /// An open latch springs back, so anything beyond `Unlock` settles there.
    #[inline]
    #[must_use]
    pub fn settled(self) -> Self {
        self.min(Position::Unlock)
    }

    /// Physical command that drives the lock towards this level.
    #[must_use]
    pub fn command(self) -> LockCommand {
        match self {
            Position::Lock => LockCommand::Lock,
            Position::Unlock => LockCommand::Unlock,
            Position::Open => LockCommand::Open,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Position::Lock => write!(f, "Lock"),
            Position::Unlock => write!(f, "Unlock"),
            Position::Open => write!(f, "Open"),
        }
    }
}

/// Movement direction of the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Stopped,
    /// Moving towards `Open`.
    Increasing,
    /// Moving towards `Lock`.
    Decreasing,
}

impl Movement {
    /// Direction implied by moving from `from` to `to`.
    ///
    /// Anything that is not strictly more open counts as closing.
    #[must_use]
    pub fn towards(from: Position, to: Position) -> Self {
        if to > from {
            Movement::Increasing
        } else {
            Movement::Decreasing
        }
    }

    /// Create a movement from the host's position state encoding.
    ///
    /// # Errors
    /// Returns `Error::InvalidMovement` if the value is not 0, 1, or 2.
    pub fn from_characteristic(value: u8) -> Result<Self> {
        match value {
            POSITION_STATE_DECREASING => Ok(Movement::Decreasing),
            POSITION_STATE_INCREASING => Ok(Movement::Increasing),
            POSITION_STATE_STOPPED => Ok(Movement::Stopped),
            _ => Err(Error::InvalidMovement { code: value }),
        }
    }

    /// Host position state encoding.
    #[inline]
    #[must_use]
    pub fn to_characteristic(self) -> u8 {
        match self {
            Movement::Decreasing => POSITION_STATE_DECREASING,
            Movement::Increasing => POSITION_STATE_INCREASING,
            Movement::Stopped => POSITION_STATE_STOPPED,
        }
    }

    /// Returns `true` if the door is not moving.
    #[inline]
    #[must_use]
    pub fn is_stopped(self) -> bool {
        matches!(self, Movement::Stopped)
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Movement::Stopped => write!(f, "Stopped"),
            Movement::Increasing => write!(f, "Increasing"),
            Movement::Decreasing => write!(f, "Decreasing"),
        }
    }
}

/// Position model exposed to the host.
///
/// While `movement` is `Stopped`, `current_position` reflects the last
/// confirmed device status. While moving it is stale until the next
/// confirmation arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionState {
    pub current_position: Position,
    pub target_position: Position,
    pub movement: Movement,
}

impl PositionState {
    /// Create a stationary state at `position`.
    #[must_use]
    pub fn stopped_at(position: Position) -> Self {
        Self {
            current_position: position,
            target_position: position,
            movement: Movement::Stopped,
        }
    }
}

impl Default for PositionState {
    fn default() -> Self {
        Self::stopped_at(Position::Lock)
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "current={} target={} movement={}",
            self.current_position, self.target_position, self.movement
        )
    }
}

/// Lock status as reported by the device itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DeviceStatus {
    Unknown = STATUS_UNKNOWN,
    Moving = STATUS_MOVING,
    Unlocked = STATUS_UNLOCKED,
    Locked = STATUS_LOCKED,
    Opened = STATUS_OPENED,
}

impl DeviceStatus {
    /// Decode a raw status code from a notification.
    ///
    /// # Errors
    /// Returns `Error::UnrecognizedStatus` for codes outside 0-4.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            STATUS_UNKNOWN => Ok(DeviceStatus::Unknown),
            STATUS_MOVING => Ok(DeviceStatus::Moving),
            STATUS_UNLOCKED => Ok(DeviceStatus::Unlocked),
            STATUS_LOCKED => Ok(DeviceStatus::Locked),
            STATUS_OPENED => Ok(DeviceStatus::Opened),
            _ => Err(Error::UnrecognizedStatus { code }),
        }
    }

    /// Raw status code.
    #[inline]
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Position the device has settled at, if this status is a resting one.
    ///
    /// `Opened` settles at `Unlock` because the latch springs back.
    #[must_use]
    pub fn resting_position(self) -> Option<Position> {
        match self {
            DeviceStatus::Locked => Some(Position::Lock),
            DeviceStatus::Unlocked | DeviceStatus::Opened => Some(Position::Unlock),
            DeviceStatus::Moving | DeviceStatus::Unknown => None,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceStatus::Unknown => write!(f, "UNKNOWN"),
            DeviceStatus::Moving => write!(f, "MOVING"),
            DeviceStatus::Unlocked => write!(f, "UNLOCKED"),
            DeviceStatus::Locked => write!(f, "LOCKED"),
            DeviceStatus::Opened => write!(f, "OPENED"),
        }
    }
}

/// Physical command accepted by the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockCommand {
    Lock,
    Unlock,
    Open,
}

impl LockCommand {
    /// Lowercase command name, as used in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            LockCommand::Lock => "lock",
            LockCommand::Unlock => "unlock",
            LockCommand::Open => "open",
        }
    }

    /// Status the device is expected to report once the command completes.
    #[must_use]
    pub fn expected_status(self) -> DeviceStatus {
        match self {
            LockCommand::Lock => DeviceStatus::Locked,
            LockCommand::Unlock => DeviceStatus::Unlocked,
            LockCommand::Open => DeviceStatus::Opened,
        }
    }
}

impl fmt::Display for LockCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Position::Lock)]
    #[case(1, Position::Unlock)]
    #[case(50, Position::Unlock)]
    #[case(99, Position::Unlock)]
    #[case(100, Position::Open)]
    fn test_position_from_percent(#[case] input: u8, #[case] expected: Position) {
        assert_eq!(Position::from_percent(input).unwrap(), expected);
    }

    #[rstest]
    #[case(101)]
    #[case(255)]
    fn test_position_from_percent_invalid(#[case] input: u8) {
        let result = Position::from_percent(input);
        assert!(matches!(result, Err(Error::InvalidPosition { value }) if value == input));
    }

    #[test]
    fn test_position_ordering() {
        assert!(Position::Lock < Position::Unlock);
        assert!(Position::Unlock < Position::Open);
        assert_eq!(Position::Open.as_percent(), 100);
        assert_eq!(Position::Unlock.as_percent(), 50);
        assert_eq!(Position::Lock.as_percent(), 0);
    }

    #[rstest]
    #[case(Position::Lock, Position::Lock)]
    #[case(Position::Unlock, Position::Unlock)]
    #[case(Position::Open, Position::Unlock)]
    fn test_position_settled(#[case] input: Position, #[case] expected: Position) {
        assert_eq!(input.settled(), expected);
    }

    #[rstest]
    #[case(Position::Lock, LockCommand::Lock)]
    #[case(Position::Unlock, LockCommand::Unlock)]
    #[case(Position::Open, LockCommand::Open)]
    fn test_position_command(#[case] position: Position, #[case] expected: LockCommand) {
        assert_eq!(position.command(), expected);
    }

    #[rstest]
    #[case(Position::Lock, Position::Open, Movement::Increasing)]
    #[case(Position::Lock, Position::Unlock, Movement::Increasing)]
    #[case(Position::Unlock, Position::Open, Movement::Increasing)]
    #[case(Position::Open, Position::Lock, Movement::Decreasing)]
    #[case(Position::Unlock, Position::Lock, Movement::Decreasing)]
    #[case(Position::Open, Position::Unlock, Movement::Decreasing)]
    fn test_movement_towards(
        #[case] from: Position,
        #[case] to: Position,
        #[case] expected: Movement,
    ) {
        assert_eq!(Movement::towards(from, to), expected);
    }

    #[test]
    fn test_movement_characteristic() {
        assert_eq!(Movement::Decreasing.to_characteristic(), 0);
        assert_eq!(Movement::Increasing.to_characteristic(), 1);
        assert_eq!(Movement::Stopped.to_characteristic(), 2);

        assert_eq!(Movement::from_characteristic(2).unwrap(), Movement::Stopped);
        assert!(Movement::from_characteristic(3).is_err());
    }

    #[rstest]
    #[case(0, DeviceStatus::Unknown)]
    #[case(1, DeviceStatus::Moving)]
    #[case(2, DeviceStatus::Unlocked)]
    #[case(3, DeviceStatus::Locked)]
    #[case(4, DeviceStatus::Opened)]
    fn test_device_status_from_code(#[case] code: u8, #[case] expected: DeviceStatus) {
        let status = DeviceStatus::from_code(code).unwrap();
        assert_eq!(status, expected);
        assert_eq!(status.code(), code);
    }

    #[rstest]
    #[case(5)]
    #[case(99)]
    fn test_device_status_unrecognized(#[case] code: u8) {
        let result = DeviceStatus::from_code(code);
        assert!(matches!(result, Err(Error::UnrecognizedStatus { code: c }) if c == code));
    }

    #[test]
    fn test_device_status_resting_position() {
        assert_eq!(
            DeviceStatus::Locked.resting_position(),
            Some(Position::Lock)
        );
        assert_eq!(
            DeviceStatus::Unlocked.resting_position(),
            Some(Position::Unlock)
        );
        assert_eq!(
            DeviceStatus::Opened.resting_position(),
            Some(Position::Unlock)
        );
        assert_eq!(DeviceStatus::Moving.resting_position(), None);
        assert_eq!(DeviceStatus::Unknown.resting_position(), None);
    }

    #[test]
    fn test_position_state_default() {
        let state = PositionState::default();
        assert_eq!(state.current_position, Position::Lock);
        assert_eq!(state.target_position, Position::Lock);
        assert!(state.movement.is_stopped());
    }

    #[test]
    fn test_position_state_serialization() {
        let state = PositionState {
            current_position: Position::Unlock,
            target_position: Position::Open,
            movement: Movement::Increasing,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"{"current_position":"unlock","target_position":"open","movement":"increasing"}"#
        );
    }

    #[test]
    fn test_lock_command_display() {
        assert_eq!(LockCommand::Open.to_string(), "open");
        assert_eq!(LockCommand::Lock.expected_status(), DeviceStatus::Locked);
    }
}
