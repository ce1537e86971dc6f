//! Engine Integration Tests
//!
//! Drives a built engine through a fake chat adapter: activation on connect,
//! command replies, permission tiers, fault isolation and shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use streambot::models::settings::BotConfig;
use streambot::services::dispatcher::BotCommand;
use streambot::services::engine::{BotEngine, Registrations};
use streambot::services::remote::ChatEvent;
use streambot::services::scheduler::ScheduledTask;
use streambot::state::{BotContext, ChatHandle};
use streambot::{ChatCommandEvent, CommandPermission};

use crate::support::{eventually, spawn_fake_obs, FakeChat};

// ============================================================================
// Commands and components under test
// ============================================================================

/// `!so <name>` replies with a shout-out.
struct Shoutout {
    chat: ChatHandle,
}

#[async_trait]
impl BotCommand for Shoutout {
    fn shortcut(&self) -> &str {
        "!so"
    }

    async fn handle(&self, event: &ChatCommandEvent) -> anyhow::Result<()> {
        let Some(name) = event.arguments.first() else {
            anyhow::bail!("usage: !so <name>");
        };
        self.chat
            .say(&event.channel, &format!("Go follow {}!", name))
            .await?;
        Ok(())
    }
}

/// `!scene <id>` switches scenes; broadcaster only.
struct SwitchScene {
    chat: ChatHandle,
}

#[async_trait]
impl BotCommand for SwitchScene {
    fn shortcut(&self) -> &str {
        "!scene"
    }

    fn permission(&self) -> CommandPermission {
        CommandPermission::Owner
    }

    async fn handle(&self, event: &ChatCommandEvent) -> anyhow::Result<()> {
        self.chat.say(&event.channel, "switching").await?;
        Ok(())
    }
}

/// Panics on every run.
struct Broken;

#[async_trait]
impl BotCommand for Broken {
    fn shortcut(&self) -> &str {
        "!broken"
    }

    async fn handle(&self, _event: &ChatCommandEvent) -> anyhow::Result<()> {
        panic!("broken command");
    }
}

static ACTIVATIONS: AtomicUsize = AtomicUsize::new(0);

/// Counts startup-hook calls across the test binary.
struct Announcer;

#[async_trait]
impl ScheduledTask for Announcer {
    fn name(&self) -> &str {
        "announcer"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(3600)
    }

    async fn activate(&self, _ctx: &BotContext) -> anyhow::Result<()> {
        ACTIVATIONS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn perform(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

fn shoutout(ctx: &BotContext) -> Arc<dyn BotCommand> {
    Arc::new(Shoutout {
        chat: ctx.chat().clone(),
    })
}

fn switch_scene(ctx: &BotContext) -> Arc<dyn BotCommand> {
    Arc::new(SwitchScene {
        chat: ctx.chat().clone(),
    })
}

fn broken(_ctx: &BotContext) -> Arc<dyn BotCommand> {
    Arc::new(Broken)
}

fn announcer(_ctx: &BotContext) -> Arc<dyn ScheduledTask> {
    Arc::new(Announcer)
}

// ============================================================================
// Helpers
// ============================================================================

async fn start_engine(ctx: Arc<BotContext>) -> (Arc<BotEngine>, Arc<FakeChat>, tokio::task::JoinHandle<()>) {
    let engine = Arc::new(
        BotEngine::build(
            ctx,
            Registrations {
                commands: &[shoutout, switch_scene, broken],
                components: &[announcer],
            },
        )
        .await,
    );
    let chat = FakeChat::new();

    let runner = {
        let engine = Arc::clone(&engine);
        let chat = Arc::clone(&chat);
        tokio::spawn(async move {
            engine.run(chat).await.unwrap();
        })
    };
    (engine, chat, runner)
}

fn command(text: &str, is_moderator: bool, is_broadcaster: bool) -> ChatEvent {
    ChatEvent::Command(
        ChatCommandEvent::parse("-100", "viewer", text, is_moderator, is_broadcaster).unwrap(),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_engine_end_to_end() {
    let ctx = Arc::new(BotContext::new(BotConfig::default(), None));
    let (engine, chat, runner) = start_engine(ctx).await;

    assert_eq!(engine.command_names().await, vec!["!broken", "!so"]);

    // Components activate once, however often chat reconnects.
    let before = ACTIVATIONS.load(Ordering::SeqCst);
    chat.emit(ChatEvent::Connected).await;
    chat.emit(ChatEvent::Disconnected).await;
    chat.emit(ChatEvent::Connected).await;

    chat.emit(command("!so alice", false, false)).await;
    eventually(|| chat.sent().len() == 1).await;
    assert_eq!(chat.sent()[0], ("-100".to_string(), "Go follow alice!".to_string()));
    assert_eq!(ACTIVATIONS.load(Ordering::SeqCst), before + 1);

    // Owner command from a moderator: silently dropped.
    chat.emit(command("!scene game", true, false)).await;
    // Panicking and failing handlers leave later commands working.
    chat.emit(command("!broken", false, false)).await;
    chat.emit(command("!so", false, false)).await;
    chat.emit(command("!unknown", false, false)).await;
    chat.emit(command("!scene game", false, true)).await;

    eventually(|| chat.sent().len() == 2).await;
    assert_eq!(chat.sent()[1].1, "switching");

    let status = engine.status().await;
    assert!(status.running);
    assert!(status.connected_since.is_some());
    assert_eq!(status.commands_handled, 2);
    assert_eq!(status.commands_failed, 2);

    engine.shutdown();
    runner.await.unwrap();
    assert!(chat.is_stopped());
    assert!(!engine.status().await.running);

    // With the adapter gone, replies have nowhere to go.
    assert!(engine.context().say("-100", "late").await.is_err());
}

static MUTES: AtomicUsize = AtomicUsize::new(0);

/// Mutes the first audio source on every run.
struct AutoMute {
    audio: Option<streambot::services::obs::AudioService>,
}

#[async_trait]
impl ScheduledTask for AutoMute {
    fn name(&self) -> &str {
        "auto-mute"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn perform(&self) -> anyhow::Result<()> {
        let audio = self
            .audio
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no streaming application"))?;
        let sources = audio.get_sources().await?;
        if let Some(source) = sources.first() {
            audio.set_muted(source, true).await?;
            MUTES.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

fn auto_mute(ctx: &BotContext) -> Arc<dyn ScheduledTask> {
    Arc::new(AutoMute {
        audio: ctx.audio_service().ok(),
    })
}

#[tokio::test(start_paused = true)]
async fn test_component_drives_streaming_application() {
    let (client, log) = spawn_fake_obs(|request| match request["method"].as_str() {
        Some("getSources") => Ok(json!([
            {"sourceId": "mic", "resourceId": "AudioSource[\"mic\"]", "name": "Mic", "muted": false}
        ])),
        Some("setMuted") => Ok(json!(null)),
        _ => Err((-32601, "Method not found")),
    });
    assert!(client.wait_ready().await);

    let ctx = Arc::new(BotContext::new(BotConfig::default(), Some(client)));
    let engine = BotEngine::build(
        Arc::clone(&ctx),
        Registrations {
            commands: &[],
            components: &[auto_mute],
        },
    )
    .await;
    assert_eq!(engine.context().scheduler().len().await, 1);

    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(MUTES.load(Ordering::SeqCst), 3);
    assert_eq!(
        log.methods(),
        vec!["getSources", "setMuted", "getSources", "setMuted", "getSources", "setMuted"]
    );
    let mute = &log.all()[1];
    assert_eq!(mute["params"]["resource"], "AudioSource[\"mic\"]");
    assert_eq!(mute["params"]["args"], json!([true]));
}
