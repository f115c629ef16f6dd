//! Fantasy League Service Library
//!
//! Configuration loading, logging setup and league startup for the
//! `fantasy-league` command-line front end.

use anyhow::{Context, Result};
use league_core::{Clock, LeagueService, NotificationSink, SystemClock, TracingNotifier};
use std::path::Path;
use std::sync::Arc;

pub mod config;
pub mod logging;

pub use config::{LoggingConfig, ServiceConfig};
pub use logging::initialize_logging_with_config;

/// Load configuration from an optional file and environment variables
pub fn load_configuration(path: Option<&Path>) -> Result<ServiceConfig> {
    config::load_config(path).context("Failed to load service configuration")
}

/// Open the configured store and start the league on the system clock
pub async fn start_league(config: &ServiceConfig) -> Result<LeagueService> {
    start_league_with(config, Arc::new(SystemClock), Arc::new(TracingNotifier)).await
}

pub async fn start_league_with(
    config: &ServiceConfig,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
) -> Result<LeagueService> {
    let store = league_store::open_store(&config.store).await.context("Failed to open league store")?;
    let league = LeagueService::open(config.league.clone(), store, clock, notifier)
        .await
        .context("Failed to start league")?;
    Ok(league)
}
