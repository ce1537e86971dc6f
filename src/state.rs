//! Bot Context
//!
//! The explicit context object handed to commands and components: it owns
//! the transport handle, the schedule and the command map, and gives access
//! to the active chat adapter.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::settings::BotConfig;
use crate::services::dispatcher::CommandDispatcher;
use crate::services::obs::{AudioService, ScenesService};
use crate::services::remote::{ChatAdapter, ChatError};
use crate::services::rpc::{RpcClient, RpcError};
use crate::services::scheduler::Scheduler;

/// Cloneable handle to whichever chat adapter is active.
///
/// Commands and components keep one of these to talk back to chat; the slot
/// is filled when the engine starts an adapter.
#[derive(Clone, Default)]
pub struct ChatHandle {
    adapter: Arc<RwLock<Option<Arc<dyn ChatAdapter>>>>,
}

impl ChatHandle {
    pub async fn set(&self, adapter: Arc<dyn ChatAdapter>) {
        *self.adapter.write().await = Some(adapter);
    }

    pub async fn clear(&self) {
        *self.adapter.write().await = None;
    }

    /// Send `text` to `channel` through the active adapter.
    pub async fn say(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        let adapter = self.adapter.read().await.clone();
        match adapter {
            Some(adapter) => adapter.send_message(channel, text).await,
            None => Err(ChatError::NotStarted),
        }
    }
}

/// Runtime context shared by the engine, commands and components.
pub struct BotContext {
    config: BotConfig,
    obs: Option<Arc<RpcClient>>,
    scheduler: Scheduler,
    commands: CommandDispatcher,
    chat: ChatHandle,
}

impl BotContext {
    /// Create the context. `obs` is `None` when the streaming application
    /// link is disabled.
    ///
    /// Must be called from within a tokio runtime (the scheduler spawns its
    /// driver).
    pub fn new(config: BotConfig, obs: Option<Arc<RpcClient>>) -> Self {
        Self {
            config,
            obs,
            scheduler: Scheduler::new(),
            commands: CommandDispatcher::new(),
            chat: ChatHandle::default(),
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Transport to the streaming application.
    pub fn obs(&self) -> Result<Arc<RpcClient>, RpcError> {
        self.obs.clone().ok_or(RpcError::NotConnected)
    }

    pub fn audio_service(&self) -> Result<AudioService, RpcError> {
        self.obs().map(AudioService::new)
    }

    pub fn scenes_service(&self) -> Result<ScenesService, RpcError> {
        self.obs().map(ScenesService::new)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn commands(&self) -> &CommandDispatcher {
        &self.commands
    }

    pub fn chat(&self) -> &ChatHandle {
        &self.chat
    }

    /// Send `text` to `channel` through the active chat adapter.
    pub async fn say(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        self.chat.say(channel, text).await
    }

    /// Stop background work: the scheduler driver and the transport.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
        if let Some(obs) = &self.obs {
            obs.shutdown();
        }
    }
}
