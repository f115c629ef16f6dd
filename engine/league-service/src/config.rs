//! Service configuration management

use anyhow::{Context, Result};
use league_core::LeagueConfig;
use league_store::{StoreBackend, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// League rules, season calendar and auth
    #[serde(default)]
    pub league: LeagueConfig,

    /// Store backend selection
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: "compact".to_string() }
    }
}

/// Load configuration from an optional TOML file, then environment variables
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    dotenv::dotenv().ok();

    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => ServiceConfig::default(),
    };

    load_from_env(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a TOML file
fn load_from_file(path: &Path) -> Result<ServiceConfig> {
    tracing::debug!("Loading configuration from file: {:?}", path);
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Load configuration from environment variables
fn load_from_env(config: &mut ServiceConfig) -> Result<()> {
    config.league.apply_env()?;

    if let Ok(level) = std::env::var("LEAGUE_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Ok(format) = std::env::var("LEAGUE_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Ok(backend) = std::env::var("LEAGUE_STORE_BACKEND") {
        config.store.backend = backend.parse::<StoreBackend>().map_err(anyhow::Error::msg)?;
    }

    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.store.database.url = url;
    }

    if let Ok(seed) = std::env::var("LEAGUE_SEED_PATH") {
        config.store.seed_path = Some(PathBuf::from(seed));
    }

    Ok(())
}

/// Validate configuration
fn validate_config(config: &ServiceConfig) -> Result<()> {
    config.league.validate()?;
    config.store.validate()?;

    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    Ok(())
}

/// Save configuration to a TOML file
pub fn save_config(config: &ServiceConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write config file: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_bad_logging_config_is_rejected() {
        let mut config = ServiceConfig::default();
        config.logging.format = "xml".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = ServiceConfig::default();
        config.logging.level = "loud".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fantasy-league.toml");

        let mut config = ServiceConfig::default();
        config.league.league_name = "Sunday League".to_string();
        config.league.roster.starter_slots = 5;
        config.logging.format = "json".to_string();
        save_config(&config, &path).unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.league.league_name, "Sunday League");
        assert_eq!(loaded.league.roster.starter_slots, 5);
        assert_eq!(loaded.logging.format, "json");
        assert!(validate_config(&loaded).is_ok());
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\nformat = \"pretty\"\n").unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.logging.level, "debug");
        assert_eq!(loaded.league.roster.starter_slots, 3);
        assert_eq!(loaded.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sections.toml");
        std::fs::write(&path, "[league]\nleague_name = \"Office\"\n\n[store]\nbackend = \"postgres\"\n").unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.league.league_name, "Office");
        assert_eq!(loaded.league.season.week_count, 18);
        assert_eq!(loaded.league.roster.starter_slots, 3);
        assert_eq!(loaded.store.backend, StoreBackend::Postgres);
        assert_eq!(loaded.store.database.max_connections, 10);
        assert_eq!(loaded.logging.level, "warn");
        assert!(validate_config(&loaded).is_ok());
    }
}
