//! Configuration management
//!
//! Loads configuration from config.toml at startup.
//! Fee rates, venues and the polling interval all come from here.

use crate::exchanges::VenueKind;
use crate::matching::{DedupePolicy, MatchStrategy};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
///
/// Loaded from config.toml at startup. Missing sections fall back to the
/// defaults below.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Polling loop and matching settings
    #[serde(default)]
    pub arb: ArbConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Venues to poll, in ledger column order
    #[serde(default = "default_venues")]
    pub venues: Vec<VenueConfig>,
}

/// Polling loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArbConfig {
    /// Pause between cycles in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Directory holding the daily ledger files
    #[serde(default = "default_ledger_dir")]
    pub ledger_dir: PathBuf,

    /// Matching algorithm
    #[serde(default)]
    pub matcher: MatchStrategy,

    /// Duplicate handling after reconciliation
    #[serde(default)]
    pub dedupe: DedupePolicy,

    /// Log a metrics snapshot every N cycles (0 = only at shutdown)
    #[serde(default = "default_metrics_every")]
    pub metrics_every_cycles: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Root directory for rolling log files
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// Default filter directive (overridden by RUST_LOG)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also log to stdout
    #[serde(default = "default_console")]
    pub console: bool,
}

/// One venue to poll
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VenueConfig {
    /// Identifier used in books and ledgers (e.g. "Kraken")
    pub name: String,

    /// Which adapter to use
    pub kind: VenueKind,

    /// Venue-specific pair code (e.g. "BTCEUR", "XXBTZEUR")
    pub pair: String,

    /// Book depth to request, where the venue supports it
    #[serde(default = "default_depth")]
    pub depth: u32,

    /// Fee rate (0.001 = 0.1%); fetched from the venue when absent
    #[serde(default)]
    pub fee_rate: Option<Decimal>,

    /// Override the adapter's API root
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arb: ArbConfig::default(),
            logging: LoggingConfig::default(),
            venues: default_venues(),
        }
    }
}

impl Default for ArbConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            ledger_dir: default_ledger_dir(),
            matcher: MatchStrategy::default(),
            dedupe: DedupePolicy::default(),
            metrics_every_cycles: default_metrics_every(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            level: default_log_level(),
            console: default_console(),
        }
    }
}

fn default_poll_interval() -> u64 {
    3
}

fn default_request_timeout() -> u64 {
    10
}

fn default_ledger_dir() -> PathBuf {
    PathBuf::from("ledger")
}

fn default_metrics_every() -> u64 {
    100
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_console() -> bool {
    true
}

fn default_depth() -> u32 {
    10
}

fn default_venues() -> Vec<VenueConfig> {
    vec![
        VenueConfig {
            name: "Coinmetro".to_string(),
            kind: VenueKind::Coinmetro,
            pair: "BTCEUR".to_string(),
            depth: default_depth(),
            fee_rate: Some(Decimal::new(1, 3)), // 0.1%
            base_url: None,
        },
        VenueConfig {
            name: "Kraken".to_string(),
            kind: VenueKind::Kraken,
            pair: "XXBTZEUR".to_string(),
            depth: default_depth(),
            fee_rate: None,
            base_url: None,
        },
    ]
}

impl Config {
    /// Load configuration from config.toml file
    ///
    /// The path comes from `CONFIG_PATH` when set. If the file doesn't
    /// exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be read, parsed or validated.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        let config = match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(ConfigError::IoError(e)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text (no validation)
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Reject configurations the polling loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arb.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be positive".to_string(),
            ));
        }

        if self.venues.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "at least two venues are required, got {}",
                self.venues.len()
            )));
        }

        let mut names = HashSet::new();
        for venue in &self.venues {
            if venue.name.trim().is_empty() {
                return Err(ConfigError::Invalid("venue name must not be empty".to_string()));
            }
            if !names.insert(venue.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate venue name {}",
                    venue.name
                )));
            }
            if let Some(rate) = venue.fee_rate {
                if rate < Decimal::ZERO || rate >= Decimal::ONE {
                    return Err(ConfigError::Invalid(format!(
                        "{}: fee_rate {} outside [0, 1)",
                        venue.name, rate
                    )));
                }
            }
            if let Some(base_url) = &venue.base_url {
                url::Url::parse(base_url).map_err(|e| {
                    ConfigError::Invalid(format!("{}: invalid base_url {}: {}", venue.name, base_url, e))
                })?;
            }
        }

        Ok(())
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.arb.poll_interval_secs)
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.arb.request_timeout_secs)
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading file
    IoError(std::io::Error),
    /// Parse error (invalid TOML)
    ParseError(String),
    /// Values that parse but cannot be used
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::ParseError(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            ConfigError::ParseError(_) | ConfigError::Invalid(_) => None,
        }
    }
}
