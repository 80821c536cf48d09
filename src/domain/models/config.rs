//! Service configuration model.

use serde::{Deserialize, Serialize};

/// Main configuration structure for the reminder service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Scheduler tunables
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Push gateway configuration
    #[serde(default)]
    pub push: PushConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            http: HttpConfig::default(),
            scheduler: SchedulerConfig::default(),
            push: PushConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".pursue/reminders.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token callers must present on every request. Empty means
    /// the server refuses to start; there is no unauthenticated mode.
    #[serde(default)]
    pub auth_token: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8340
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            auth_token: String::new(),
        }
    }
}

/// Push gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PushConfig {
    /// Gateway endpoint receiving notification payloads. Empty disables
    /// real dispatch (notifications are logged and recorded only).
    #[serde(default)]
    pub gateway_url: String,

    /// API key sent to the gateway
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_push_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_push_timeout_secs() -> u64 {
    10
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            gateway_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_push_timeout_secs(),
        }
    }
}

/// Scheduler tunables. Defaults reflect the shipped behavior; every value is
/// overridable for staging experiments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Cross-goal daily reminder cap per user
    #[serde(default = "default_daily_cap")]
    pub daily_cap: u32,

    /// Consecutive all-ineffective days after which only last-chance fires
    #[serde(default = "default_soft_suppression_days")]
    pub soft_suppression_days: u32,

    /// Consecutive all-ineffective days after which nothing fires
    #[serde(default = "default_hard_suppression_days")]
    pub hard_suppression_days: u32,

    /// Minimum pattern confidence for smart scheduling
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Hours after a pattern window closes before the gentle tier fires
    #[serde(default = "default_grace_hours")]
    pub grace_hours: u32,

    /// Hours after window close before supportive fires (balanced)
    #[serde(default = "default_supportive_gap_hours")]
    pub supportive_gap_hours: u32,

    /// Hours after window close before supportive fires (persistent)
    #[serde(default = "default_persistent_gap_hours")]
    pub persistent_gap_hours: u32,

    /// Local hour the fixed last-chance window opens
    #[serde(default = "default_last_chance_start_hour")]
    pub last_chance_start_hour: u8,

    /// Local hour the last-chance window closes
    #[serde(default = "default_last_chance_end_hour")]
    pub last_chance_end_hour: u8,

    /// Default-schedule gentle eligibility hour (no usable pattern)
    #[serde(default = "default_fallback_gentle_hour")]
    pub fallback_gentle_hour: u8,

    /// Default-schedule supportive eligibility hour
    #[serde(default = "default_fallback_supportive_hour")]
    pub fallback_supportive_hour: u8,

    /// Days of history the pattern calculator looks back over
    #[serde(default = "default_pattern_lookback_days")]
    pub pattern_lookback_days: u32,

    /// Minimum qualifying samples for a pattern
    #[serde(default = "default_min_pattern_samples")]
    pub min_pattern_samples: u32,

    /// Minimum local-date span (days) the samples must cover
    #[serde(default = "default_min_pattern_span_days")]
    pub min_pattern_span_days: u32,

    /// Days of reminder history consulted for suppression
    #[serde(default = "default_suppression_lookback_days")]
    pub suppression_lookback_days: u32,

    /// Hours back the effectiveness updater scans for unresolved records
    #[serde(default = "default_effectiveness_lookback_hours")]
    pub effectiveness_lookback_hours: u32,

    /// Warn when a batch run takes longer than this many seconds
    #[serde(default = "default_run_duration_warn_secs")]
    pub run_duration_warn_secs: u64,
}

const fn default_daily_cap() -> u32 {
    6
}

const fn default_soft_suppression_days() -> u32 {
    7
}

const fn default_hard_suppression_days() -> u32 {
    15
}

const fn default_min_confidence() -> f64 {
    0.3
}

const fn default_grace_hours() -> u32 {
    1
}

const fn default_supportive_gap_hours() -> u32 {
    3
}

const fn default_persistent_gap_hours() -> u32 {
    2
}

const fn default_last_chance_start_hour() -> u8 {
    21
}

const fn default_last_chance_end_hour() -> u8 {
    23
}

const fn default_fallback_gentle_hour() -> u8 {
    11
}

const fn default_fallback_supportive_hour() -> u8 {
    16
}

const fn default_pattern_lookback_days() -> u32 {
    30
}

const fn default_min_pattern_samples() -> u32 {
    5
}

const fn default_min_pattern_span_days() -> u32 {
    7
}

const fn default_suppression_lookback_days() -> u32 {
    30
}

const fn default_effectiveness_lookback_hours() -> u32 {
    48
}

const fn default_run_duration_warn_secs() -> u64 {
    60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            daily_cap: default_daily_cap(),
            soft_suppression_days: default_soft_suppression_days(),
            hard_suppression_days: default_hard_suppression_days(),
            min_confidence: default_min_confidence(),
            grace_hours: default_grace_hours(),
            supportive_gap_hours: default_supportive_gap_hours(),
            persistent_gap_hours: default_persistent_gap_hours(),
            last_chance_start_hour: default_last_chance_start_hour(),
            last_chance_end_hour: default_last_chance_end_hour(),
            fallback_gentle_hour: default_fallback_gentle_hour(),
            fallback_supportive_hour: default_fallback_supportive_hour(),
            pattern_lookback_days: default_pattern_lookback_days(),
            min_pattern_samples: default_min_pattern_samples(),
            min_pattern_span_days: default_min_pattern_span_days(),
            suppression_lookback_days: default_suppression_lookback_days(),
            effectiveness_lookback_hours: default_effectiveness_lookback_hours(),
            run_duration_warn_secs: default_run_duration_warn_secs(),
        }
    }
}
