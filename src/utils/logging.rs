//! Logging
//!
//! Installs the global `tracing` subscriber for the binary.

use tracing_subscriber::EnvFilter;

use super::error::{AppError, AppResult};

/// Install a fmt subscriber. `RUST_LOG` wins over `default_level` when set.
///
/// Fails with [`AppError::Config`] if the level does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(default_level: &str) -> AppResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|e| AppError::config(format!("invalid log level '{}': {}", default_level, e)))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| AppError::config(format!("failed to install tracing subscriber: {}", e)))
}
