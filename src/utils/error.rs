//! Error Handling
//!
//! Application-level error type. Each layer keeps its own error enum
//! (`CodecError`, `RpcError`, `ChatError`); this one wraps them for the
//! binary and for configuration loading.

use thiserror::Error;

use crate::services::remote::ChatError;
use crate::services::rpc::RpcError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Streaming application transport errors
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Chat platform errors
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
