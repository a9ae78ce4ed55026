//! Common types shared by lock device implementations.

use chrono::{DateTime, Utc};
use keyble_core::DeviceStatus;
use serde::{Deserialize, Serialize};

/// Generic device information.
///
/// Contains metadata about the lock such as name, model, serial number,
/// and firmware version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "Front Door").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional device serial number.
    pub serial_number: Option<String>,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            serial_number: None,
            firmware_version: None,
        }
    }

    /// Set the serial number.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// Point-in-time status pushed by the lock.
///
/// The code is kept raw so that values the model does not know about still
/// reach the consumer and can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotification {
    /// Raw status identifier.
    pub code: u8,

    /// When the notification was received.
    pub received_at: DateTime<Utc>,
}

impl StatusNotification {
    /// Create a notification stamped with the current time.
    pub fn new(code: u8) -> Self {
        Self {
            code,
            received_at: Utc::now(),
        }
    }

    /// Decode the raw code.
    ///
    /// # Errors
    /// Returns `keyble_core::Error::UnrecognizedStatus` for unknown codes.
    pub fn status(&self) -> keyble_core::Result<DeviceStatus> {
        DeviceStatus::from_code(self.code)
    }
}

impl From<DeviceStatus> for StatusNotification {
    fn from(status: DeviceStatus) -> Self {
        Self::new(status.code())
    }
}
