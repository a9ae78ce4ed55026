//! Error types for lock transport operations.
//!
//! This module defines error types for the wireless link to the lock,
//! covering disconnection, timeouts, and commands rejected by the device.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while talking to the lock.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// A command was issued without an established session.
    #[error("No session established with {device}")]
    NotConnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The device refused or failed to execute a command.
    #[error("Command '{command}' rejected: {message}")]
    CommandRejected { command: String, message: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new not connected error.
    pub fn not_connected(device: impl Into<String>) -> Self {
        Self::NotConnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new command rejected error.
    pub fn command_rejected(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandRejected {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
