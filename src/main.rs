// Streambot - Bot Entry Point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use streambot::models::settings::BotConfig;
use streambot::services::engine::{
    BotEngine, CommandConstructor, ComponentConstructor, Registrations,
};
use streambot::services::remote::TelegramAdapter;
use streambot::services::rpc::RpcClient;
use streambot::state::BotContext;
use streambot::utils::logging::init_tracing;

/// Commands compiled into this binary.
const COMMANDS: &[CommandConstructor] = &[];

/// Recurring components compiled into this binary.
const COMPONENTS: &[ComponentConstructor] = &[];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = BotConfig::load(config_path.as_deref()).context("loading configuration")?;
    init_tracing(&config.log_level)?;

    let obs = if config.obs.enabled {
        let client = RpcClient::connect_local(&config.obs.endpoint, &config.obs.transport_config());
        if client.wait_ready().await {
            info!(endpoint = %config.obs.endpoint, "streaming application link ready");
        } else {
            warn!(endpoint = %config.obs.endpoint, "streaming application unavailable, continuing without it");
        }
        Some(Arc::new(client))
    } else {
        None
    };

    let adapter = Arc::new(TelegramAdapter::new(config.telegram.clone())?);
    let ctx = Arc::new(BotContext::new(config, obs));
    let engine = Arc::new(
        BotEngine::build(
            Arc::clone(&ctx),
            Registrations {
                commands: COMMANDS,
                components: COMPONENTS,
            },
        )
        .await,
    );

    let mut runner = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.run(adapter).await })
    };

    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            engine.shutdown();
            (&mut runner).await
        }
        outcome = &mut runner => outcome,
    };

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "bot engine failed"),
        Err(e) => error!(error = %e, "bot engine task panicked"),
    }
    ctx.shutdown();
    Ok(())
}
