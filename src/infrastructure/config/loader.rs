use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid daily_cap: {0}. Must be at least 1")]
    InvalidDailyCap(u32),

    #[error(
        "Invalid suppression thresholds: soft ({0}) must be less than hard ({1})"
    )]
    InvalidSuppressionThresholds(u32, u32),

    #[error("Invalid hour value for {field}: {value}. Must be 0-23")]
    InvalidHour { field: &'static str, value: u8 },

    #[error(
        "Invalid last-chance window: start ({0}) must be before end ({1})"
    )]
    InvalidLastChanceWindow(u8, u8),

    #[error("Invalid min_confidence: {0}. Must be within [0, 1]")]
    InvalidMinConfidence(f64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. pursue.yaml in the working directory
    /// 3. Environment variables (PURSUE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("pursue.yaml"))
            .merge(Env::prefixed("PURSUE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("PURSUE_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let scheduler = &config.scheduler;
        if scheduler.daily_cap == 0 {
            return Err(ConfigError::InvalidDailyCap(scheduler.daily_cap));
        }
        if scheduler.soft_suppression_days >= scheduler.hard_suppression_days {
            return Err(ConfigError::InvalidSuppressionThresholds(
                scheduler.soft_suppression_days,
                scheduler.hard_suppression_days,
            ));
        }
        if !(0.0..=1.0).contains(&scheduler.min_confidence) {
            return Err(ConfigError::InvalidMinConfidence(scheduler.min_confidence));
        }

        for (field, value) in [
            ("last_chance_start_hour", scheduler.last_chance_start_hour),
            ("last_chance_end_hour", scheduler.last_chance_end_hour),
            ("fallback_gentle_hour", scheduler.fallback_gentle_hour),
            ("fallback_supportive_hour", scheduler.fallback_supportive_hour),
        ] {
            if value > 23 {
                return Err(ConfigError::InvalidHour { field, value });
            }
        }
        if scheduler.last_chance_start_hour >= scheduler.last_chance_end_hour {
            return Err(ConfigError::InvalidLastChanceWindow(
                scheduler.last_chance_start_hour,
                scheduler.last_chance_end_hour,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_suppression_ordering_enforced() {
        let mut config = Config::default();
        config.scheduler.soft_suppression_days = 15;
        config.scheduler.hard_suppression_days = 7;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSuppressionThresholds(15, 7))
        ));
    }

    #[test]
    fn test_hour_bounds_enforced() {
        let mut config = Config::default();
        config.scheduler.last_chance_start_hour = 24;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidHour { .. })
        ));
    }
}
