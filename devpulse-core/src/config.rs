//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/devpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/devpulse/` (~/.config/devpulse/)
//! - Data: `$XDG_DATA_HOME/devpulse/` (~/.local/share/devpulse/)
//! - State/Logs: `$XDG_STATE_HOME/devpulse/` (~/.local/state/devpulse/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Coding-activity provider (WakaTime-compatible API)
    #[serde(default)]
    pub coding: CodingConfig,

    /// Contribution-graph provider (GitHub GraphQL API)
    #[serde(default)]
    pub contributions: ContributionConfig,

    /// Refresh windows, throttling and backfill ceilings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Rollup ("wrapped") settings
    #[serde(default)]
    pub rollup: RollupConfig,

    /// Shared HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Coding-activity provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CodingConfig {
    /// API key (can also use `WAKATIME_API_KEY`)
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_coding_base_url")]
    pub base_url: String,

    /// Timezone used for hourly bucketing when the provider does not report one
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for CodingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_coding_base_url(),
            timezone: default_timezone(),
        }
    }
}

impl CodingConfig {
    /// Check if the coding source has its credential
    pub fn is_ready(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn default_coding_base_url() -> String {
    "https://wakatime.com/api/v1".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Contribution-graph provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ContributionConfig {
    /// Personal access token (can also use `GITHUB_TOKEN`)
    pub token: Option<String>,

    /// Account whose contributions are read (can also use `GITHUB_LOGIN`)
    pub login: Option<String>,

    /// GraphQL endpoint
    #[serde(default = "default_graphql_endpoint")]
    pub endpoint: String,
}

impl Default for ContributionConfig {
    fn default() -> Self {
        Self {
            token: None,
            login: None,
            endpoint: default_graphql_endpoint(),
        }
    }
}

impl ContributionConfig {
    /// Check if both token and login are present
    pub fn is_ready(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.token) && present(&self.login)
    }
}

fn default_graphql_endpoint() -> String {
    "https://api.github.com/graphql".to_string()
}

/// Refresh windows and limits
#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    /// Trailing days covered by a manual coding summary refresh
    #[serde(default = "default_coding_days")]
    pub coding_days: i64,

    /// Trailing days covered by a manual hourly refresh
    #[serde(default = "default_hourly_days")]
    pub hourly_days: i64,

    /// Trailing days covered by a manual contribution refresh
    #[serde(default = "default_contribution_days")]
    pub contribution_days: i64,

    /// Minimum minutes between scheduled hourly refreshes
    #[serde(default = "default_hourly_min_minutes")]
    pub hourly_min_minutes: i64,

    /// Widest span accepted by daily and contribution backfills
    #[serde(default = "default_max_backfill_days")]
    pub max_backfill_days: i64,

    /// Widest span accepted by hourly backfills (one upstream call per day)
    #[serde(default = "default_max_hourly_backfill_days")]
    pub max_hourly_backfill_days: i64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            coding_days: default_coding_days(),
            hourly_days: default_hourly_days(),
            contribution_days: default_contribution_days(),
            hourly_min_minutes: default_hourly_min_minutes(),
            max_backfill_days: default_max_backfill_days(),
            max_hourly_backfill_days: default_max_hourly_backfill_days(),
        }
    }
}

impl RefreshConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("refresh.coding_days", self.coding_days),
            ("refresh.hourly_days", self.hourly_days),
            ("refresh.contribution_days", self.contribution_days),
            ("refresh.max_backfill_days", self.max_backfill_days),
            ("refresh.max_hourly_backfill_days", self.max_hourly_backfill_days),
        ];
        for (name, value) in windows {
            if value < 1 {
                return Err(Error::Config(format!("{} must be at least 1", name)));
            }
        }
        // Trailing windows stay within what a backfill could cover
        let bounded = [
            ("refresh.coding_days", self.coding_days, self.max_backfill_days),
            ("refresh.hourly_days", self.hourly_days, self.max_hourly_backfill_days),
            (
                "refresh.contribution_days",
                self.contribution_days,
                self.max_backfill_days.min(crate::sources::contributions::MAX_SPAN_DAYS),
            ),
        ];
        for (name, value, max) in bounded {
            if value > max {
                return Err(Error::Config(format!("{} must be at most {}", name, max)));
            }
        }
        if self.hourly_min_minutes < 0 {
            return Err(Error::Config(
                "refresh.hourly_min_minutes must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_coding_days() -> i64 {
    7
}

fn default_hourly_days() -> i64 {
    7
}

fn default_contribution_days() -> i64 {
    30
}

fn default_hourly_min_minutes() -> i64 {
    360
}

fn default_max_backfill_days() -> i64 {
    366
}

fn default_max_hourly_backfill_days() -> i64 {
    92
}

/// Rollup configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RollupConfig {
    /// Entries kept in each ranked list
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

/// HTTP client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// HTTP request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// User-Agent sent to providers (GitHub rejects requests without one)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("devpulse/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path, then apply env credentials
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.refresh.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Fill credentials missing from the file using an environment lookup.
    ///
    /// Values already present in the file win.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.coding.api_key.is_none() {
            self.coding.api_key = lookup("WAKATIME_API_KEY");
        }
        if self.contributions.token.is_none() {
            self.contributions.token = lookup("GITHUB_TOKEN");
        }
        if self.contributions.login.is_none() {
            self.contributions.login = lookup("GITHUB_LOGIN");
        }
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/devpulse/config.toml` (~/.config/devpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("devpulse").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/devpulse/` (~/.local/share/devpulse/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("devpulse")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/devpulse/` (~/.local/state/devpulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("devpulse")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/devpulse/data.db` (~/.local/share/devpulse/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("devpulse.log")
    }
}
