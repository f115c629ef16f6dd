//! Configuration for the league core

use crate::calendar::WeekWindow;
use crate::error::{LeagueError, Result};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Season calendar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    /// Start of week 1
    pub start: DateTime<Utc>,

    /// Number of consecutive 7-day weeks generated from `start`
    pub week_count: u32,

    /// Explicit week windows; when non-empty they replace the generated ones
    pub windows: Vec<WeekWindow>,
}

/// Roster and trade rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterRules {
    /// Active lineup size
    pub starter_slots: usize,

    /// Trades must swap the same number of players each way
    pub require_balanced_trades: bool,
}

/// Scoring display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Maximum absolute perturbation applied to projections
    pub projection_jitter: f64,
}

/// Local identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared league password checked by the local identity provider
    pub league_password: String,
}

/// Notification display durations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub success_duration_ms: u64,
    pub error_duration_ms: u64,
}

/// League core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    pub league_name: String,
    pub season: SeasonConfig,
    pub roster: RosterRules,
    pub scoring: ScoringConfig,
    pub auth: AuthConfig,
    pub notifications: NotificationConfig,
}

/// September 4th of next year, 00:00 UTC
fn default_season_start() -> DateTime<Utc> {
    let year = Utc::now().year() + 1;
    Utc.with_ymd_and_hms(year, 9, 4, 0, 0, 0).single().unwrap_or_else(Utc::now)
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self { start: default_season_start(), week_count: 18, windows: Vec::new() }
    }
}

impl Default for RosterRules {
    fn default() -> Self {
        Self { starter_slots: 3, require_balanced_trades: true }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { projection_jitter: 3.0 }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { league_password: "1234".to_string() }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { success_duration_ms: 3000, error_duration_ms: 5000 }
    }
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            league_name: "Fantasy League".to_string(),
            season: SeasonConfig::default(),
            roster: RosterRules::default(),
            scoring: ScoringConfig::default(),
            auth: AuthConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| LeagueError::invalid_config(format!("Invalid {name}: '{raw}'"))),
        Err(_) => Ok(None),
    }
}

impl LeagueConfig {
    /// Create config from defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `LEAGUE_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(name) = std::env::var("LEAGUE_NAME") {
            self.league_name = name;
        }
        if let Ok(raw) = std::env::var("LEAGUE_SEASON_START") {
            self.season.start = DateTime::parse_from_rfc3339(&raw)
                .map_err(|_| LeagueError::invalid_config(format!("Invalid LEAGUE_SEASON_START: '{raw}'")))?
                .with_timezone(&Utc);
        }
        if let Some(weeks) = parse_env::<u32>("LEAGUE_SEASON_WEEKS")? {
            self.season.week_count = weeks;
        }
        if let Some(slots) = parse_env::<usize>("LEAGUE_STARTER_SLOTS")? {
            self.roster.starter_slots = slots;
        }
        if let Some(balanced) = parse_env::<bool>("LEAGUE_BALANCED_TRADES")? {
            self.roster.require_balanced_trades = balanced;
        }
        if let Some(jitter) = parse_env::<f64>("LEAGUE_PROJECTION_JITTER")? {
            self.scoring.projection_jitter = jitter;
        }
        if let Ok(password) = std::env::var("LEAGUE_PASSWORD") {
            self.auth.league_password = password;
        }
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LeagueError::invalid_config(format!("Cannot read {:?}: {e}", path.as_ref()))
        })?;
        let config: LeagueConfig = toml::from_str(&content)
            .map_err(|e| LeagueError::invalid_config(format!("Invalid league config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LeagueError::invalid_config(format!("Cannot serialize config: {e}")))?;
        std::fs::write(path.as_ref(), content).map_err(|e| {
            LeagueError::invalid_config(format!("Cannot write {:?}: {e}", path.as_ref()))
        })?;
        Ok(())
    }

    /// Week windows in effect: explicit ones if given, otherwise generated
    pub fn week_windows(&self) -> Vec<WeekWindow> {
        if !self.season.windows.is_empty() {
            return self.season.windows.clone();
        }
        WeekWindow::consecutive(self.season.start, self.season.week_count)
    }

    pub fn validate(&self) -> Result<()> {
        if self.roster.starter_slots == 0 {
            return Err(LeagueError::invalid_config("starter_slots must be greater than 0"));
        }
        if !self.scoring.projection_jitter.is_finite() || self.scoring.projection_jitter < 0.0 {
            return Err(LeagueError::invalid_config("projection_jitter must be a non-negative number"));
        }
        if self.auth.league_password.is_empty() {
            return Err(LeagueError::invalid_config("league_password must not be empty"));
        }

        let mut windows = self.season.windows.clone();
        windows.sort_by_key(|w| w.week);
        for window in &windows {
            if window.week == 0 {
                return Err(LeagueError::invalid_config("week numbers start at 1"));
            }
            if window.end < window.start {
                return Err(LeagueError::invalid_config(format!(
                    "week {} ends before it starts",
                    window.week
                )));
            }
        }
        for pair in windows.windows(2) {
            if pair[0].week == pair[1].week {
                return Err(LeagueError::invalid_config(format!("week {} is defined twice", pair[0].week)));
            }
            if pair[1].start <= pair[0].end {
                return Err(LeagueError::invalid_config(format!(
                    "week {} overlaps week {}",
                    pair[1].week, pair[0].week
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LeagueConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.roster.starter_slots, 3);
        assert_eq!(config.scoring.projection_jitter, 3.0);
        assert_eq!(config.week_windows().len(), 18);
        assert_eq!(config.season.start.month(), 9);
        assert_eq!(config.season.start.day(), 4);
    }

    #[test]
    fn test_explicit_windows_take_precedence() {
        let start = Utc.with_ymd_and_hms(2030, 9, 4, 0, 0, 0).unwrap();
        let mut config = LeagueConfig::default();
        config.season.windows = WeekWindow::consecutive(start, 2);

        let windows = config.week_windows();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start, start);
    }

    #[test]
    fn test_overlapping_windows_are_rejected() {
        let start = Utc.with_ymd_and_hms(2030, 9, 4, 0, 0, 0).unwrap();
        let mut config = LeagueConfig::default();
        config.season.windows = vec![
            WeekWindow { week: 1, start, end: start + chrono::Duration::days(7) },
            WeekWindow {
                week: 2,
                start: start + chrono::Duration::days(6),
                end: start + chrono::Duration::days(13),
            },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let mut config = LeagueConfig::default();
        config.roster.starter_slots = 0;
        assert!(config.validate().is_err());

        let mut config = LeagueConfig::default();
        config.scoring.projection_jitter = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("league.toml");

        let mut config = LeagueConfig::default();
        config.league_name = "Office League".to_string();
        config.roster.starter_slots = 9;
        config.to_file(&path).unwrap();

        let loaded = LeagueConfig::from_file(&path).unwrap();
        assert_eq!(loaded.league_name, "Office League");
        assert_eq!(loaded.roster.starter_slots, 9);
        assert_eq!(loaded.season.start, config.season.start);
    }

    #[test]
    fn test_partial_config_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "league_name = \"Office\"\n[season]\nweek_count = 10\n[roster]\nstarter_slots = 4\n")
            .unwrap();

        let loaded = LeagueConfig::from_file(&path).unwrap();
        assert_eq!(loaded.league_name, "Office");
        assert_eq!(loaded.week_windows().len(), 10);
        assert_eq!(loaded.roster.starter_slots, 4);
        assert!(loaded.roster.require_balanced_trades);
        assert_eq!(loaded.auth.league_password, "1234");
        assert_eq!(loaded.notifications.error_duration_ms, 5000);
    }
}
