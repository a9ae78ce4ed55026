//! Configuration for lock accessories.
//!
//! Lock entries are read from the host's JSON platform block. Addressing and
//! credentials are opaque here: they are validated for shape and handed to
//! the transport untouched.
//!
//! # Example
//!
//! ```
//! use keyble_accessory::config::BridgeConfig;
//!
//! let json = r#"{
//!     "locks": [{
//!         "name": "Front Door",
//!         "address": "00:1a:22:0a:91:cf",
//!         "user_id": 1,
//!         "user_key": "ca78ad9b96131414359e5e7cecfd7f9e"
//!     }]
//! }"#;
//!
//! let config = BridgeConfig::from_json(json).unwrap();
//! assert_eq!(config.locks[0].manufacturer, "eqiva");
//! ```

use std::path::Path;

use keyble_core::constants::{
    DEFAULT_MANUFACTURER, DEFAULT_MODEL, DEFAULT_SERIAL_NUMBER, USER_KEY_HEX_LENGTH,
};
use keyble_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default capacity of the host event queue.
pub const DEFAULT_EVENT_CAPACITY: usize = 32;

/// Default capacity of the characteristic update queue.
pub const DEFAULT_UPDATE_CAPACITY: usize = 100;

/// One lock as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Display name shown by the host.
    pub name: String,

    /// Wireless address of the lock.
    pub address: String,

    /// User slot registered on the lock.
    pub user_id: u8,

    /// User key, hex encoded.
    pub user_key: String,

    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_serial_number")]
    pub serial_number: String,
}

fn default_manufacturer() -> String {
    DEFAULT_MANUFACTURER.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_serial_number() -> String {
    DEFAULT_SERIAL_NUMBER.to_string()
}

impl LockConfig {
    /// Check that required fields are present and well formed.
    ///
    /// # Errors
    /// Returns `Error::MissingConfig` for empty required fields and
    /// `Error::Config` for a malformed user key.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::MissingConfig("name".to_string()));
        }
        if self.address.trim().is_empty() {
            return Err(Error::MissingConfig(format!("{}: address", self.name)));
        }
        if self.user_key.len() != USER_KEY_HEX_LENGTH
            || !self.user_key.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(Error::Config(format!(
                "{}: user_key must be {USER_KEY_HEX_LENGTH} hex characters",
                self.name
            )));
        }
        Ok(())
    }
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub locks: Vec<LockConfig>,
}

impl BridgeConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// Returns `Error::Json` for malformed JSON and the validation error of
    /// the first invalid lock entry.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, otherwise as
    /// [`BridgeConfig::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Validate every lock entry.
    ///
    /// # Errors
    /// Returns the first validation error found.
    pub fn validate(&self) -> Result<()> {
        self.locks.iter().try_for_each(LockConfig::validate)
    }
}

/// Tuning for a single accessory engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessoryConfig {
    /// Capacity of the host event queue.
    pub event_capacity: usize,

    /// Capacity of the characteristic update queue.
    ///
    /// Every published state takes three slots.
    pub update_capacity: usize,
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            update_capacity: DEFAULT_UPDATE_CAPACITY,
        }
    }
}
