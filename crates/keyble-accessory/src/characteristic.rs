//! Host-facing characteristic model.
//!
//! The lock is published to the host as a Door service with three
//! characteristics. The two position characteristics deliberately have
//! different domains: the target may ask for `Open`, but the current
//! position never reports beyond `Unlock`.

use std::fmt;

use keyble_core::PositionState;
use keyble_core::constants::{
    CURRENT_POSITION_MAX, POSITION_MIN, POSITION_STATE_DECREASING, POSITION_STATE_STOPPED,
    POSITION_STEP, TARGET_POSITION_MAX,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};

use crate::config::LockConfig;

/// Accessory information service contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryInformation {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

impl From<&LockConfig> for AccessoryInformation {
    fn from(config: &LockConfig) -> Self {
        Self {
            name: config.name.clone(),
            manufacturer: config.manufacturer.clone(),
            model: config.model.clone(),
            serial_number: config.serial_number.clone(),
        }
    }
}

/// Characteristics of the Door service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Characteristic {
    CurrentPosition,
    TargetPosition,
    PositionState,
}

impl Characteristic {
    /// Valid domain declared to the host.
    #[must_use]
    pub fn props(self) -> CharacteristicProps {
        match self {
            Characteristic::CurrentPosition => CharacteristicProps {
                min_value: POSITION_MIN,
                max_value: CURRENT_POSITION_MAX,
                min_step: POSITION_STEP,
            },
            Characteristic::TargetPosition => CharacteristicProps {
                min_value: POSITION_MIN,
                max_value: TARGET_POSITION_MAX,
                min_step: POSITION_STEP,
            },
            Characteristic::PositionState => CharacteristicProps {
                min_value: POSITION_STATE_DECREASING,
                max_value: POSITION_STATE_STOPPED,
                min_step: 1,
            },
        }
    }

    /// Whether the host may write this characteristic.
    #[must_use]
    pub fn is_writable(self) -> bool {
        matches!(self, Characteristic::TargetPosition)
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Characteristic::CurrentPosition => write!(f, "Current Position"),
            Characteristic::TargetPosition => write!(f, "Target Position"),
            Characteristic::PositionState => write!(f, "Position State"),
        }
    }
}

/// Declared range of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicProps {
    pub min_value: u8,
    pub max_value: u8,
    pub min_step: u8,
}

impl CharacteristicProps {
    /// Check whether `value` is inside the declared range and on a step.
    #[must_use]
    pub fn accepts(&self, value: u8) -> bool {
        (self.min_value..=self.max_value).contains(&value)
            && (value - self.min_value) % self.min_step == 0
    }
}

/// Value pushed to the host without a pending read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacteristicUpdate {
    CurrentPosition(u8),
    TargetPosition(u8),
    PositionState(u8),
}

impl CharacteristicUpdate {
    /// The three updates describing `state`, in host order.
    #[must_use]
    pub fn for_state(state: &PositionState) -> [Self; 3] {
        [
            Self::CurrentPosition(state.current_position.as_percent()),
            Self::TargetPosition(state.target_position.as_percent()),
            Self::PositionState(state.movement.to_characteristic()),
        ]
    }

    /// Characteristic being updated.
    #[must_use]
    pub fn characteristic(&self) -> Characteristic {
        match self {
            Self::CurrentPosition(_) => Characteristic::CurrentPosition,
            Self::TargetPosition(_) => Characteristic::TargetPosition,
            Self::PositionState(_) => Characteristic::PositionState,
        }
    }

    /// Raw value sent to the host.
    #[must_use]
    pub fn value(&self) -> u8 {
        match self {
            Self::CurrentPosition(v) | Self::TargetPosition(v) | Self::PositionState(v) => *v,
        }
    }
}

/// Pushes characteristic updates to the host.
///
/// The engine never waits on the host. A triple is queued whole or not at
/// all: when the queue cannot take all three updates the triple is dropped
/// with a warning, and the latest state stays readable through the accessory
/// handle.
#[derive(Debug, Clone)]
pub struct HostNotifier {
    name: String,
    tx: mpsc::Sender<CharacteristicUpdate>,
}

impl HostNotifier {
    /// Create a notifier and the receiver the host drains.
    pub fn channel(
        name: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<CharacteristicUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                name: name.into(),
                tx,
            },
            rx,
        )
    }

    /// Push all three characteristics of `state`, changed or not.
    pub fn publish(&self, state: &PositionState) {
        let updates = CharacteristicUpdate::for_state(state);
        match self.tx.try_reserve_many(updates.len()) {
            Ok(permits) => {
                for (permit, update) in permits.zip(updates) {
                    permit.send(update);
                }
            }
            Err(TrySendError::Full(())) => {
                warn!(
                    "{}: host not draining updates, dropped {}",
                    self.name, state
                );
            }
            Err(TrySendError::Closed(())) => {
                trace!("{}: host update receiver closed", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyble_core::{Movement, Position};
    use rstest::rstest;

    #[test]
    fn test_position_domains_are_asymmetric() {
        let current = Characteristic::CurrentPosition.props();
        let target = Characteristic::TargetPosition.props();

        assert_eq!(current.min_value, 0);
        assert_eq!(current.max_value, 50);
        assert_eq!(target.max_value, 100);
        assert_eq!(current.min_step, target.min_step);
    }

    #[rstest]
    #[case(Characteristic::TargetPosition, 0, true)]
    #[case(Characteristic::TargetPosition, 50, true)]
    #[case(Characteristic::TargetPosition, 100, true)]
    #[case(Characteristic::TargetPosition, 25, false)]
    #[case(Characteristic::CurrentPosition, 100, false)]
    #[case(Characteristic::PositionState, 2, true)]
    #[case(Characteristic::PositionState, 3, false)]
    fn test_props_accepts(
        #[case] characteristic: Characteristic,
        #[case] value: u8,
        #[case] expected: bool,
    ) {
        assert_eq!(characteristic.props().accepts(value), expected);
    }

    #[test]
    fn test_only_target_is_writable() {
        assert!(Characteristic::TargetPosition.is_writable());
        assert!(!Characteristic::CurrentPosition.is_writable());
        assert!(!Characteristic::PositionState.is_writable());
    }

    #[test]
    fn test_updates_for_state() {
        let state = PositionState {
            current_position: Position::Lock,
            target_position: Position::Open,
            movement: Movement::Increasing,
        };

        let updates = CharacteristicUpdate::for_state(&state);
        assert_eq!(
            updates,
            [
                CharacteristicUpdate::CurrentPosition(0),
                CharacteristicUpdate::TargetPosition(100),
                CharacteristicUpdate::PositionState(1),
            ]
        );
        assert_eq!(
            updates[2].characteristic(),
            Characteristic::PositionState
        );
        assert_eq!(updates[1].value(), 100);
    }

    #[test]
    fn test_information_from_config() {
        let config = LockConfig {
            name: "Front Door".to_string(),
            address: "00:1a:22:0a:91:cf".to_string(),
            user_id: 1,
            user_key: "ca78ad9b96131414359e5e7cecfd7f9e".to_string(),
            manufacturer: "eqiva".to_string(),
            model: "eq3".to_string(),
            serial_number: "Default-Serial".to_string(),
        };

        let info = AccessoryInformation::from(&config);
        assert_eq!(info.name, "Front Door");
        assert_eq!(info.manufacturer, "eqiva");
    }

    #[tokio::test]
    async fn test_notifier_publishes_three_updates() {
        let (notifier, mut rx) = HostNotifier::channel("Front Door", 8);

        notifier.publish(&PositionState::stopped_at(Position::Unlock));

        assert_eq!(rx.recv().await, Some(CharacteristicUpdate::CurrentPosition(50)));
        assert_eq!(rx.recv().await, Some(CharacteristicUpdate::TargetPosition(50)));
        assert_eq!(rx.recv().await, Some(CharacteristicUpdate::PositionState(2)));
    }

    #[tokio::test]
    async fn test_notifier_drops_whole_triple_when_full() {
        let (notifier, mut rx) = HostNotifier::channel("Front Door", 2);

        notifier.publish(&PositionState::default());

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notifier_never_splits_a_triple() {
        let (notifier, mut rx) = HostNotifier::channel("Front Door", 4);

        notifier.publish(&PositionState::default());
        notifier.publish(&PositionState::stopped_at(Position::Unlock));

        let received: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            received,
            CharacteristicUpdate::for_state(&PositionState::default()).to_vec()
        );
    }

    #[tokio::test]
    async fn test_notifier_resumes_after_host_drains() {
        let (notifier, mut rx) = HostNotifier::channel("Front Door", 4);
        let unlocked = PositionState::stopped_at(Position::Unlock);

        notifier.publish(&PositionState::default());
        notifier.publish(&unlocked);
        for _ in 0..3 {
            rx.recv().await.unwrap();
        }
        notifier.publish(&unlocked);

        let received: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(received, CharacteristicUpdate::for_state(&unlocked).to_vec());
    }

    #[test]
    fn test_notifier_tolerates_closed_host() {
        let (notifier, rx) = HostNotifier::channel("Front Door", 2);
        drop(rx);

        notifier.publish(&PositionState::default());
    }
}
