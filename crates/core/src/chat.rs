//! Chat Command Types
//!
//! Permission tiers for chat commands and the parsed form of an incoming
//! command message, independent of the chat platform that delivered it.

use serde::{Deserialize, Serialize};

/// Character that marks a chat message as a command (`!so someone`).
pub const COMMAND_PREFIX: char = '!';

/// Who may run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommandPermission {
    /// Anyone in chat
    #[default]
    User,
    /// Moderators and the broadcaster
    Moderator,
    /// The broadcaster only
    Owner,
}

impl CommandPermission {
    /// Check whether a sender with the given roles passes this tier.
    pub fn allows(self, is_moderator: bool, is_broadcaster: bool) -> bool {
        match self {
            CommandPermission::User => true,
            CommandPermission::Moderator => is_moderator || is_broadcaster,
            CommandPermission::Owner => is_broadcaster,
        }
    }
}

/// A command typed into chat, with the sender's roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCommandEvent {
    /// Channel (or chat) the command was typed in.
    pub channel: String,
    /// The command token including its prefix, e.g. `"!so"`.
    pub command: String,
    pub username: String,
    pub is_moderator: bool,
    pub is_broadcaster: bool,
    /// Whitespace-separated arguments following the command token.
    pub arguments: Vec<String>,
}

impl ChatCommandEvent {
    /// Parse a chat message into a command event.
    ///
    /// Returns `None` unless the first token starts with [`COMMAND_PREFIX`]
    /// and has at least one character after it.
    pub fn parse(
        channel: impl Into<String>,
        username: impl Into<String>,
        text: &str,
        is_moderator: bool,
        is_broadcaster: bool,
    ) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let command = tokens.next()?;
        if !command.starts_with(COMMAND_PREFIX) || command.len() == COMMAND_PREFIX.len_utf8() {
            return None;
        }

        Some(Self {
            channel: channel.into(),
            command: command.to_string(),
            username: username.into(),
            is_moderator,
            is_broadcaster,
            arguments: tokens.map(str::to_string).collect(),
        })
    }
}
