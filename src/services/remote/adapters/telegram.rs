//! Telegram Adapter
//!
//! Telegram Bot adapter using teloxide for long-polling message reception.
//! Bot commands (`/so@streambot name`) are delivered as chat commands
//! (`!so name`); sender roles come from the configured owner and moderator
//! user ids.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use streambot_core::{ChatCommandEvent, COMMAND_PREFIX};

use super::ChatAdapter;
use crate::models::settings::TelegramSettings;
use crate::services::remote::types::{ChatAdapterType, ChatError, ChatEvent};

/// Telegram Bot adapter using teloxide with long-polling.
pub struct TelegramAdapter {
    pub(crate) settings: TelegramSettings,
    pub(crate) bot: teloxide::Bot,
    pub(crate) cancel_token: CancellationToken,
}

impl TelegramAdapter {
    pub fn new(settings: TelegramSettings) -> Result<Self, ChatError> {
        let bot_token = settings
            .bot_token
            .as_ref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ChatError::ConfigError("Bot token is required".to_string()))?;

        let bot = teloxide::Bot::new(bot_token.reveal());

        Ok(Self {
            settings,
            bot,
            cancel_token: CancellationToken::new(),
        })
    }
}

/// Who may talk to the bot, and with which roles.
#[derive(Debug, Clone)]
struct Access {
    owners: Vec<i64>,
    moderators: Vec<i64>,
    allowed_chats: Vec<i64>,
}

impl Access {
    fn from_settings(settings: &TelegramSettings) -> Self {
        Self {
            owners: settings.owner_user_ids.clone(),
            moderators: settings.moderator_user_ids.clone(),
            allowed_chats: settings.allowed_chat_ids.clone(),
        }
    }

    /// Empty whitelist = allow all
    fn allows_chat(&self, chat_id: i64) -> bool {
        self.allowed_chats.is_empty() || self.allowed_chats.contains(&chat_id)
    }

    /// `(is_moderator, is_broadcaster)` for a sender.
    fn roles(&self, user_id: i64) -> (bool, bool) {
        (self.moderators.contains(&user_id), self.owners.contains(&user_id))
    }

    /// Turn one incoming message into a command event, if it is one.
    fn command_event(
        &self,
        chat_id: i64,
        user_id: i64,
        username: &str,
        text: &str,
    ) -> Option<ChatCommandEvent> {
        if !self.allows_chat(chat_id) {
            return None;
        }
        let text = normalize_command(text)?;
        let (is_moderator, is_broadcaster) = self.roles(user_id);
        ChatCommandEvent::parse(
            chat_id.to_string(),
            username,
            &text,
            is_moderator,
            is_broadcaster,
        )
    }
}

/// Rewrite a Telegram bot command into chat-command form.
///
/// `/so@streambot name` becomes `!so name`; text already starting with the
/// command prefix is kept; anything else is not a command.
pub fn normalize_command(text: &str) -> Option<String> {
    let text = text.trim_start();

    if let Some(rest) = text.strip_prefix('/') {
        let (token, tail) = match rest.find(char::is_whitespace) {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        let name = token.split_once('@').map_or(token, |(name, _)| name);
        if name.is_empty() {
            return None;
        }
        return Some(format!("{}{}{}", COMMAND_PREFIX, name, tail));
    }

    text.starts_with(COMMAND_PREFIX).then(|| text.to_string())
}

/// Split long messages at line boundaries to respect platform limits.
///
/// `max_chars` counts characters, not bytes, so multi-byte text is never cut
/// inside a character.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        let separator = usize::from(!current.is_empty());

        if current_len + separator + line_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            // Handle single lines longer than max_chars
            if line_len > max_chars {
                let chars: Vec<char> = line.chars().collect();
                chunks.extend(chars.chunks(max_chars).map(|piece| piece.iter().collect::<String>()));
                continue;
            }
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[async_trait]
impl ChatAdapter for TelegramAdapter {
    fn adapter_type(&self) -> ChatAdapterType {
        ChatAdapterType::Telegram
    }

    async fn start(&self, event_tx: mpsc::Sender<ChatEvent>) -> Result<(), ChatError> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::prelude::*;
        use teloxide::types::{Message, Update};

        // Verify the token before reporting a connection.
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| ChatError::ConnectFailed(format!("Bot health check failed: {}", e)))?;
        info!(bot = %me.username(), "telegram bot connected");

        let bot = self.bot.clone();
        let access = Access::from_settings(&self.settings);
        let cancel = self.cancel_token.clone();

        tokio::spawn(async move {
            let command_tx = event_tx.clone();
            let handler =
                Update::filter_message().endpoint(move |msg: Message, _bot: teloxide::Bot| {
                    let tx = command_tx.clone();
                    let access = access.clone();
                    async move {
                        let Some(text) = msg.text() else {
                            return Ok::<(), Box<dyn std::error::Error + Send + Sync>>(());
                        };
                        let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
                        let username = msg
                            .from
                            .as_ref()
                            .map(|u| u.username.clone().unwrap_or_else(|| u.first_name.clone()))
                            .unwrap_or_default();

                        if let Some(event) =
                            access.command_event(msg.chat.id.0, user_id, &username, text)
                        {
                            debug!(command = %event.command, username = %event.username, "telegram command received");
                            let _ = tx.send(ChatEvent::Command(event)).await;
                        }
                        Ok(())
                    }
                });

            let mut dispatcher = Dispatcher::builder(bot, handler).build();

            // Get shutdown token for graceful termination
            let shutdown_token = dispatcher.shutdown_token();
            tokio::spawn(async move {
                cancel.cancelled().await;
                let _ = shutdown_token.shutdown();
            });

            let _ = event_tx.send(ChatEvent::Connected).await;
            dispatcher.dispatch().await;
            warn!("telegram dispatcher stopped");
            let _ = event_tx.send(ChatEvent::Disconnected).await;
        });

        Ok(())
    }

    async fn stop(&self) -> Result<(), ChatError> {
        self.cancel_token.cancel();
        Ok(())
    }

    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        use teloxide::prelude::*;
        use teloxide::types::ChatId;

        let chat_id: i64 = channel
            .parse()
            .map_err(|_| ChatError::InvalidChannel(channel.to_string()))?;

        for chunk in split_message(text, self.settings.max_message_length) {
            self.bot
                .send_message(ChatId(chat_id), &chunk)
                .await
                .map_err(|e| ChatError::SendFailed(e.to_string()))?;
        }
        Ok(())
    }
}
