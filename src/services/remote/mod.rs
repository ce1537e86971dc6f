//! Chat Binding
//!
//! Connects the bot to a chat platform. Currently supports Telegram.
//!
//! ## Architecture
//!
//! ```text
//! Chat Platform → ChatAdapter → mpsc<ChatEvent> → BotEngine
//!                      ↑                              ↓
//!                      └──── send_message ←── BotContext::say
//! ```

pub mod adapters;
pub mod types;

pub use adapters::telegram::TelegramAdapter;
pub use adapters::ChatAdapter;
pub use types::*;
