//! Command Dispatcher
//!
//! Routes chat commands to registered handlers by shortcut, enforcing the
//! command's permission tier. Unknown commands and denied senders are dropped
//! silently; a failing handler is logged and affects nothing else.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, error};

use streambot_core::{ChatCommandEvent, CommandPermission};

use crate::state::BotContext;
use crate::utils::isolate::isolated;

/// Suffix appended to moderator-only entries of [`CommandDispatcher::command_names`].
pub const MOD_ONLY_SUFFIX: &str = " (mod-only)";

/// A chat command.
#[async_trait]
pub trait BotCommand: Send + Sync {
    /// Command token including its prefix, e.g. `"!so"`.
    fn shortcut(&self) -> &str;

    fn permission(&self) -> CommandPermission {
        CommandPermission::User
    }

    /// One-time setup before registration. Returning `false` keeps the
    /// command out of the dispatcher.
    async fn initialize(&self, _ctx: &BotContext) -> bool {
        true
    }

    /// Run the command for `event.username` with `event.arguments`.
    async fn handle(&self, event: &ChatCommandEvent) -> anyhow::Result<()>;
}

/// What happened to a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran and returned `Ok`.
    Handled,
    /// No command is registered under the shortcut.
    Unknown,
    /// The sender lacks the command's permission tier.
    Denied,
    /// The handler returned an error or panicked; it was logged.
    Failed,
}

/// Shortcut → command map.
#[derive(Default)]
pub struct CommandDispatcher {
    commands: RwLock<HashMap<String, Arc<dyn BotCommand>>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command` under its shortcut, replacing (and returning) any
    /// earlier registration for the same shortcut.
    pub async fn register(&self, command: Arc<dyn BotCommand>) -> Option<Arc<dyn BotCommand>> {
        let shortcut = command.shortcut().to_string();
        debug!(shortcut = %shortcut, permission = ?command.permission(), "command registered");
        self.commands.write().await.insert(shortcut, command)
    }

    /// Route one event to its handler.
    pub async fn dispatch(&self, event: &ChatCommandEvent) -> DispatchOutcome {
        // Clone out of the map so a slow handler never holds the lock.
        let command = self.commands.read().await.get(&event.command).cloned();
        let Some(command) = command else {
            return DispatchOutcome::Unknown;
        };

        if !command
            .permission()
            .allows(event.is_moderator, event.is_broadcaster)
        {
            debug!(
                shortcut = %event.command,
                username = %event.username,
                "command denied"
            );
            return DispatchOutcome::Denied;
        }

        match isolated(command.handle(event)).await {
            Ok(()) => DispatchOutcome::Handled,
            Err(e) => {
                error!(shortcut = %event.command, error = %e, "error running command");
                DispatchOutcome::Failed
            }
        }
    }

    /// Shortcuts anyone may be told about, in ascending order.
    ///
    /// Owner commands are omitted; moderator commands carry
    /// [`MOD_ONLY_SUFFIX`].
    pub async fn command_names(&self) -> Vec<String> {
        let commands = self.commands.read().await;
        let mut names: Vec<(&String, CommandPermission)> = commands
            .iter()
            .map(|(shortcut, command)| (shortcut, command.permission()))
            .filter(|(_, permission)| *permission != CommandPermission::Owner)
            .collect();
        names.sort_by(|a, b| a.0.cmp(b.0));

        names
            .into_iter()
            .map(|(shortcut, permission)| match permission {
                CommandPermission::Moderator => format!("{}{}", shortcut, MOD_ONLY_SUFFIX),
                _ => shortcut.clone(),
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.commands.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.commands.read().await.is_empty()
    }
}
