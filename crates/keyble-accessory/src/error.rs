//! Error types for the accessory engine.

use keyble_hardware::HardwareError;

/// Result type alias for accessory operations.
pub type Result<T> = std::result::Result<T, AccessoryError>;

/// Errors surfaced to the host binding.
///
/// Command failures never show up here. They are recovered inside the engine
/// by re-querying the lock.
#[derive(Debug, thiserror::Error)]
pub enum AccessoryError {
    /// Invalid value or configuration.
    #[error(transparent)]
    Core(#[from] keyble_core::Error),

    /// Device error outside the command path.
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// The engine task is no longer running.
    #[error("Accessory engine for '{name}' has stopped")]
    EngineStopped { name: String },
}

impl AccessoryError {
    /// Create a new engine stopped error.
    pub fn engine_stopped(name: impl Into<String>) -> Self {
        Self::EngineStopped { name: name.into() }
    }
}
