//! Chat Adapters
//!
//! Trait implemented by each chat platform binding.

pub mod telegram;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{ChatAdapterType, ChatError, ChatEvent};

/// Chat platform adapter.
///
/// Adapters are responsible for:
/// - Receiving messages and turning commands into [`ChatEvent::Command`]
/// - Reporting connection changes as [`ChatEvent::Connected`] /
///   [`ChatEvent::Disconnected`]
/// - Sending text back, split to the platform's length limit
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Adapter type identifier
    fn adapter_type(&self) -> ChatAdapterType;

    /// Start receiving. Events are forwarded through `event_tx`; the adapter
    /// spawns its own task for the receive loop.
    async fn start(&self, event_tx: mpsc::Sender<ChatEvent>) -> Result<(), ChatError>;

    /// Stop receiving.
    async fn stop(&self) -> Result<(), ChatError>;

    /// Send `text` to `channel`.
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ChatError>;
}
