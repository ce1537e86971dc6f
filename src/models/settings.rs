//! Settings Models
//!
//! Bot configuration, read from a TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use streambot_core::Secret;

use crate::services::rpc::{TransportConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_ENDPOINT};
use crate::utils::error::{AppError, AppResult};

/// Environment variable that overrides the configured Telegram bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "STREAMBOT_TELEGRAM_TOKEN";

/// Bot configuration stored in config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    /// Name the bot announces itself with
    pub bot_name: String,
    /// Default channel for messages not tied to a command
    pub channel: String,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    pub obs: ObsSettings,
    pub telegram: TelegramSettings,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_name: "streambot".to_string(),
            channel: String::new(),
            log_level: "info".to_string(),
            obs: ObsSettings::default(),
            telegram: TelegramSettings::default(),
        }
    }
}

/// Link to the streaming application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObsSettings {
    pub enabled: bool,
    /// Unix socket path or Windows pipe name
    pub endpoint: String,
    pub connect_timeout_ms: u64,
    /// Per-call timeout; unset means calls wait indefinitely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_timeout_ms: Option<u64>,
}

impl Default for ObsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            call_timeout_ms: None,
        }
    }
}

impl ObsSettings {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            call_timeout: self.call_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Telegram chat binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TelegramSettings {
    #[serde(skip_serializing)]
    pub bot_token: Option<Secret>,
    /// Users treated as the broadcaster
    pub owner_user_ids: Vec<i64>,
    pub moderator_user_ids: Vec<i64>,
    /// Chats the bot listens in; empty allows all
    pub allowed_chat_ids: Vec<i64>,
    pub max_message_length: usize,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            owner_user_ids: Vec::new(),
            moderator_user_ids: Vec::new(),
            allowed_chat_ids: Vec::new(),
            max_message_length: 4000,
        }
    }
}

impl BotConfig {
    /// Default location: `<config dir>/streambot/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("streambot").join("config.toml"))
    }

    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used and a missing file yields the defaults. The token environment
    /// variable is applied last.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Ok(token) = std::env::var(TELEGRAM_TOKEN_ENV) {
            config.apply_token_override(token);
        }
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&text)?)
    }

    fn apply_token_override(&mut self, token: String) {
        if !token.trim().is_empty() {
            self.telegram.bot_token = Some(Secret::new(token.trim()));
        }
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> AppResult<()> {
        if self.obs.enabled && self.obs.endpoint.trim().is_empty() {
            return Err(AppError::config("obs.endpoint must not be empty"));
        }
        if self.obs.connect_timeout_ms == 0 {
            return Err(AppError::config("obs.connect_timeout_ms must be positive"));
        }
        if self.telegram.max_message_length == 0 {
            return Err(AppError::config("telegram.max_message_length must be positive"));
        }
        Ok(())
    }
}
