//! # Error Types
//!
//! Custom error types for VTX Control using `thiserror`.

use thiserror::Error;

/// Main error type for VTX Control
#[derive(Debug, Error)]
pub enum VtxError {
    /// Band number outside 1-5
    #[error("Invalid band: {0} (must be 1-5)")]
    InvalidBand(u8),

    /// Channel number outside 1-8
    #[error("Invalid channel: {0} (must be 1-8)")]
    InvalidChannel(u8),

    /// A VTX device is already bound to the control loop
    #[error("VTX device already registered")]
    DeviceAlreadyRegistered,

    /// Operation needs a registered VTX device
    #[error("No VTX device registered")]
    NoDevice,

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Errors writing the persisted configuration block
    #[error("Configuration serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for VTX Control
pub type Result<T> = std::result::Result<T, VtxError>;
