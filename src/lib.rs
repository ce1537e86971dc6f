//! Streambot - Chat Bot Runtime Library
//!
//! This library provides the runtime of a chat bot that can remote-control a
//! streaming application. It includes:
//! - A correlated JSON-RPC client for the streaming application's local channel
//! - An interval scheduler for recurring components
//! - Permission-checked chat command dispatch
//! - A Telegram chat binding
//! - Configuration and utilities

pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use models::settings::BotConfig;
pub use state::BotContext;
pub use utils::error::{AppError, AppResult};

pub use streambot_core::{ChatCommandEvent, CommandPermission, Secret};
