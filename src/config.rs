use crate::estimation::PAIRWISE_MEAN;
use crate::estimation::policy::{Policy, PolicyError, RefillMode, WarningRule};
use crate::state::DEFAULT_MAX_OBSERVATIONS;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// A rate needs at least one pair of readings.
pub const MIN_OBSERVATIONS: usize = 2;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub policy: Option<PolicySection>,
    #[serde(default)]
    pub estimation: Option<EstimationSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarningMode {
    Fixed,
    DeliveryDays,
}

/// Every field falls back to the built-in default when omitted.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PolicySection {
    pub min_level: Option<f64>,
    pub max_level: Option<f64>,
    pub order_volume_percent: Option<f64>,
    pub refill_mode: Option<RefillMode>,
    pub delivery_days: Option<u32>,
    pub warning_mode: Option<WarningMode>,
    /// Threshold for `warning_mode = "fixed"` (default: 2)
    pub warning_days: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EstimationSection {
    /// "pairwise_mean" (default) or "end_to_end"
    pub rate_method: Option<String>,
    /// Size of the observation log (default: 14)
    pub max_observations: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid policy: {0}")]
    Policy(#[from] PolicyError),
    #[error("warning_days only applies to warning_mode = \"fixed\"")]
    WarningDaysIgnored,
    #[error("max_observations must be at least 2, got {0}")]
    TooFewObservations(usize),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    /// Builds and validates the reorder policy.
    pub fn policy(&self) -> Result<Policy, ConfigError> {
        let section = self.policy.clone().unwrap_or_default();
        let defaults = Policy::default();

        let warning = match section.warning_mode {
            Some(WarningMode::DeliveryDays) if section.warning_days.is_some() => {
                return Err(ConfigError::WarningDaysIgnored);
            }
            Some(WarningMode::DeliveryDays) => WarningRule::DeliveryDays,
            Some(WarningMode::Fixed) | None => match section.warning_days {
                Some(days) => WarningRule::FixedDays(days),
                None => defaults.warning,
            },
        };

        let policy = Policy {
            min_level: section.min_level.unwrap_or(defaults.min_level),
            max_level: section.max_level.unwrap_or(defaults.max_level),
            order_volume_percent: section
                .order_volume_percent
                .unwrap_or(defaults.order_volume_percent),
            refill_mode: section.refill_mode.unwrap_or(defaults.refill_mode),
            delivery_days: section.delivery_days.unwrap_or(defaults.delivery_days),
            warning,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Returns the configured rate method name (default: pairwise_mean)
    pub fn rate_method(&self) -> &str {
        self.estimation
            .as_ref()
            .and_then(|s| s.rate_method.as_deref())
            .filter(|method| !method.is_empty())
            .unwrap_or(PAIRWISE_MEAN)
    }

    /// Returns the observation log capacity (default: 14)
    pub fn max_observations(&self) -> Result<usize, ConfigError> {
        let capacity = self
            .estimation
            .as_ref()
            .and_then(|s| s.max_observations)
            .unwrap_or(DEFAULT_MAX_OBSERVATIONS);
        if capacity < MIN_OBSERVATIONS {
            return Err(ConfigError::TooFewObservations(capacity));
        }
        Ok(capacity)
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn log_level(&self) -> &str {
        if self.logging.level.trim().is_empty() {
            DEFAULT_LOG_LEVEL
        } else {
            self.logging.level.trim()
        }
    }
}
