//! Streambot Core
//!
//! Data types shared by every layer of the streambot workspace. This crate has
//! no dependencies on the runtime (tokio, the RPC transport, chat platforms).
//!
//! ## Module Organization
//!
//! - `secret` - Redacting wrapper for credentials (`Secret`)
//! - `chat` - Command permission tiers and parsed chat commands
//!   (`CommandPermission`, `ChatCommandEvent`)

pub mod chat;
pub mod secret;

// ── Chat Types ─────────────────────────────────────────────────────────
pub use chat::{ChatCommandEvent, CommandPermission, COMMAND_PREFIX};

// ── Secrets ────────────────────────────────────────────────────────────
pub use secret::Secret;
