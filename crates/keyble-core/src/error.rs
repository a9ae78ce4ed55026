use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Model errors
    #[error("Invalid position: {value} (expected 0-100)")]
    InvalidPosition { value: u8 },

    #[error("Unrecognized device status code: {code}")]
    UnrecognizedStatus { code: u8 },

    #[error("Invalid position state code: {code}")]
    InvalidMovement { code: u8 },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
