//! Bot Engine
//!
//! Builds the bot from an explicit registration list and runs the event loop
//! that ties chat events to the command dispatcher and the scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::services::dispatcher::{BotCommand, DispatchOutcome};
use crate::services::remote::{ChatAdapter, ChatEvent};
use crate::services::scheduler::ScheduledTask;
use crate::state::BotContext;
use crate::utils::error::AppResult;

/// Builds one chat command.
pub type CommandConstructor = fn(&BotContext) -> Arc<dyn BotCommand>;

/// Builds one recurring component.
pub type ComponentConstructor = fn(&BotContext) -> Arc<dyn ScheduledTask>;

/// Everything the bot is made of, listed at startup.
#[derive(Clone, Copy, Default)]
pub struct Registrations<'a> {
    pub commands: &'a [CommandConstructor],
    pub components: &'a [ComponentConstructor],
}

/// Engine runtime status
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    pub connected_since: Option<DateTime<Utc>>,
    pub commands_handled: u64,
    pub commands_failed: u64,
    pub last_command_at: Option<DateTime<Utc>>,
}

pub struct BotEngine {
    ctx: Arc<BotContext>,
    status: RwLock<EngineStatus>,
    activated: AtomicBool,
    cancel_token: CancellationToken,
}

impl BotEngine {
    /// Construct every registered command and component.
    ///
    /// Commands whose `initialize` hook returns `false` are left out.
    pub async fn build(ctx: Arc<BotContext>, registrations: Registrations<'_>) -> Self {
        let engine = Self {
            ctx,
            status: RwLock::new(EngineStatus::default()),
            activated: AtomicBool::new(false),
            cancel_token: CancellationToken::new(),
        };

        for construct in registrations.commands {
            let command = construct(&engine.ctx);
            engine.add_command(command).await;
        }
        for construct in registrations.components {
            let component = construct(&engine.ctx);
            engine.add_component(component).await;
        }

        info!(
            commands = engine.ctx.commands().len().await,
            components = engine.ctx.scheduler().len().await,
            "bot engine built"
        );
        engine
    }

    /// Initialize `command` and register it if that succeeds.
    pub async fn add_command(&self, command: Arc<dyn BotCommand>) -> bool {
        if !command.initialize(&self.ctx).await {
            warn!(shortcut = command.shortcut(), "command failed to initialize, skipping");
            return false;
        }
        self.ctx.commands().register(command).await;
        true
    }

    pub async fn add_component(&self, component: Arc<dyn ScheduledTask>) {
        self.ctx.scheduler().schedule(component).await;
    }

    /// Registered commands as shown to chat users.
    pub async fn command_names(&self) -> Vec<String> {
        self.ctx.commands().command_names().await
    }

    pub fn context(&self) -> &Arc<BotContext> {
        &self.ctx
    }

    pub async fn status(&self) -> EngineStatus {
        self.status.read().await.clone()
    }

    /// Start `adapter` and process its events until [`shutdown`](Self::shutdown)
    /// or until the adapter drops its sender.
    pub async fn run(&self, adapter: Arc<dyn ChatAdapter>) -> AppResult<()> {
        // Create event channel
        let (tx, mut rx) = mpsc::channel::<ChatEvent>(100);

        adapter.start(tx).await?;
        self.ctx.chat().set(Arc::clone(&adapter)).await;
        self.status.write().await.running = true;
        info!(adapter = %adapter.adapter_type(), "bot engine running");

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        warn!("chat adapter closed its event channel");
                        break;
                    }
                },
                _ = self.cancel_token.cancelled() => {
                    break;
                }
            }
        }

        self.ctx.chat().clear().await;
        self.status.write().await.running = false;
        adapter.stop().await?;
        info!("bot engine stopped");
        Ok(())
    }

    /// Stop [`run`](Self::run).
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    async fn handle_event(&self, event: ChatEvent) {
        match event {
            ChatEvent::Connected => {
                self.status.write().await.connected_since = Some(Utc::now());
                if !self.activated.swap(true, Ordering::SeqCst) {
                    self.ctx.scheduler().activate(&self.ctx).await;
                } else {
                    debug!("chat reconnected, components already active");
                }
            }
            ChatEvent::Command(command) => {
                let outcome = self.ctx.commands().dispatch(&command).await;
                let mut status = self.status.write().await;
                match outcome {
                    DispatchOutcome::Handled => status.commands_handled += 1,
                    DispatchOutcome::Failed => status.commands_failed += 1,
                    DispatchOutcome::Unknown | DispatchOutcome::Denied => return,
                }
                status.last_command_at = Some(Utc::now());
            }
            ChatEvent::Disconnected => {
                warn!("chat disconnected");
                self.status.write().await.connected_since = None;
            }
        }
    }
}
