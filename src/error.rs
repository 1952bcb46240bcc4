//! Error types for overscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverscribeError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Engine launch errors
    #[error("Recognition engine binary not found at {path}")]
    EngineBinaryNotFound { path: String },

    #[error("Recognition model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Failed to launch recognition engine: {message}")]
    EngineLaunch { message: String },

    // Device probe errors
    #[error("Device probe failed: {message}")]
    DeviceProbe { message: String },

    // IPC errors
    #[error("IPC socket error: {message}")]
    IpcSocket { message: String },

    #[error("IPC protocol error: {message}")]
    IpcProtocol { message: String },

    #[error("IPC connection failed: {message}")]
    IpcConnection { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, OverscribeError>;
