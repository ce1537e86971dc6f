//! Chat Binding Types
//!
//! Events chat adapters deliver to the engine, and their error type.

use std::fmt;

use serde::{Deserialize, Serialize};

use streambot_core::ChatCommandEvent;

/// Chat platform an adapter talks to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChatAdapterType {
    Telegram,
    /// Adapters defined outside this crate (test doubles, consoles).
    Custom(String),
}

impl fmt::Display for ChatAdapterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatAdapterType::Telegram => write!(f, "telegram"),
            ChatAdapterType::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Something that happened on the chat side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The adapter is connected and receiving messages.
    Connected,
    /// A chat message that parsed as a command.
    Command(ChatCommandEvent),
    /// The adapter stopped receiving messages.
    Disconnected,
}

/// Chat adapter error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to connect: {0}")]
    ConnectFailed(String),

    #[error("Failed to send message: {0}")]
    SendFailed(String),

    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("No chat adapter is active")]
    NotStarted,
}
