//! Configuration settings structures for aerosense
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "aerosense".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/aerosense.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_dispatch_interval() -> u64 {
    2
}

fn default_max_concurrent_deliveries() -> usize {
    5
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_provider_base_url() -> String {
    "https://aeroapi.flightaware.com/aeroapi".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_push_timeout() -> u64 {
    10
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Whether to automatically run pending migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

impl DatabaseConfig {
    /// Validates the database configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL cannot be empty",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Minimum connections cannot exceed maximum connections",
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Poller Configuration
// ============================================================================

/// Flight poller scheduling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Interval between poll cycles in seconds
    #[serde(default = "default_poll_interval")]
    pub interval_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval(),
        }
    }
}

impl PollerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_seconds == 0 {
            return Err(ConfigError::validation(
                "poller.interval_seconds",
                "Poll interval must be at least 1 second",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Queue Configuration
// ============================================================================

/// Notification queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Interval between dispatch ticks in seconds
    #[serde(default = "default_dispatch_interval")]
    pub dispatch_interval_seconds: u64,

    /// Maximum number of deliveries in flight at once
    #[serde(default = "default_max_concurrent_deliveries")]
    pub max_concurrent_deliveries: usize,

    /// Maximum number of queued jobs before enqueue rejects
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            dispatch_interval_seconds: default_dispatch_interval(),
            max_concurrent_deliveries: default_max_concurrent_deliveries(),
            capacity: default_queue_capacity(),
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch_interval_seconds == 0 {
            return Err(ConfigError::validation(
                "queue.dispatch_interval_seconds",
                "Dispatch interval must be at least 1 second",
            ));
        }

        if self.max_concurrent_deliveries == 0 {
            return Err(ConfigError::validation(
                "queue.max_concurrent_deliveries",
                "Concurrency limit must be at least 1",
            ));
        }

        if self.capacity == 0 {
            return Err(ConfigError::validation(
                "queue.capacity",
                "Queue capacity must be at least 1",
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Flight Data Provider Configuration
// ============================================================================

/// Flight-data provider (AeroAPI) configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider API
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// API key sent with every request
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            api_key: String::new(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::validation(
                "provider.base_url",
                "Provider base URL cannot be empty",
            ));
        }

        if self.api_key.is_empty() {
            return Err(ConfigError::validation(
                "provider.api_key",
                "Provider API key cannot be empty",
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Push Gateway Configuration
// ============================================================================

/// Push-notification gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConfig {
    /// URL of the push delivery gateway
    #[serde(default)]
    pub gateway_url: String,

    /// Per-send timeout in seconds
    #[serde(default = "default_push_timeout")]
    pub timeout_seconds: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            gateway_url: String::new(),
            timeout_seconds: default_push_timeout(),
        }
    }
}

impl PushConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway_url.is_empty() {
            return Err(ConfigError::validation(
                "push.gateway_url",
                "Push gateway URL cannot be empty",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig used by the logger module.
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format =
            self.file
                .format
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::ValidationError {
                    field: "logger.file.format".to_string(),
                    message: e.to_string(),
                })?;

        let config = LoggerConfig {
            level: self.level,
            console: ConsoleConfig {
                enabled: self.console.enabled,
                colored: self.console.colored,
            },
            file: FileConfig {
                enabled: self.file.enabled,
                path: PathBuf::from(self.file.path),
                append: self.file.append,
                format,
            },
        };

        config.validate().map_err(|e| ConfigError::ValidationError {
            field: "logger".to_string(),
            message: e.to_string(),
        })?;

        Ok(config)
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
///
/// This structure represents the entire configuration that can be loaded
/// from TOML files and environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,

    /// Flight poller configuration
    #[serde(default)]
    pub poller: PollerConfig,

    /// Notification queue configuration
    #[serde(default)]
    pub queue: QueueConfig,

    /// Flight-data provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Push gateway configuration
    #[serde(default)]
    pub push: PushConfig,
}

impl Settings {
    /// Validates every configuration section.
    ///
    /// A malformed section prevents the core from starting at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.poller.validate()?;
        self.queue.validate()?;
        self.provider.validate()?;
        self.push.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_settings() -> Settings {
        Settings {
            database: DatabaseConfig {
                url: "postgres://localhost/aerosense".to_string(),
                ..Default::default()
            },
            provider: ProviderConfig {
                api_key: "test-key".to_string(),
                ..Default::default()
            },
            push: PushConfig {
                gateway_url: "https://push.example.com/send".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    // ========================================================================
    // Property-based tests
    // ========================================================================

    fn arb_poller_config() -> impl Strategy<Value = PollerConfig> {
        (1u64..=3600u64).prop_map(|interval_seconds| PollerConfig { interval_seconds })
    }

    fn arb_queue_config() -> impl Strategy<Value = QueueConfig> {
        (1u64..=60u64, 1usize..=64usize, 1usize..=100_000usize).prop_map(
            |(dispatch_interval_seconds, max_concurrent_deliveries, capacity)| QueueConfig {
                dispatch_interval_seconds,
                max_concurrent_deliveries,
                capacity,
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any in-range poller/queue section survives a TOML round trip and
        /// passes validation.
        #[test]
        fn prop_scheduling_sections_round_trip(
            poller in arb_poller_config(),
            queue in arb_queue_config(),
        ) {
            let settings = Settings {
                poller: poller.clone(),
                queue: queue.clone(),
                ..valid_settings()
            };

            let toml_str = toml::to_string(&settings).expect("Settings should serialize to TOML");
            let deserialized: Settings =
                toml::from_str(&toml_str).expect("TOML should deserialize back to Settings");

            prop_assert_eq!(settings, deserialized.clone());
            prop_assert!(deserialized.validate().is_ok());
        }
    }

    // ========================================================================
    // Unit tests
    // ========================================================================

    #[test]
    fn test_application_config_defaults() {
        let config = ApplicationConfig::default();
        assert_eq!(config.name, "aerosense");
        assert_eq!(config.version, crate::pkg_version());
    }

    #[test]
    fn test_database_config_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.url, "");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connection_timeout, 30);
        assert!(!config.auto_migrate);
    }

    #[test]
    fn test_database_config_validate_empty_url() {
        let config = DatabaseConfig::default();
        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::ValidationError { field, .. }) = result {
            assert_eq!(field, "database.url");
        }
    }

    #[test]
    fn test_database_config_validate_min_exceeds_max() {
        let config = DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 2,
            min_connections: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poller_config_defaults() {
        let config = PollerConfig::default();
        assert_eq!(config.interval_seconds, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poller_config_rejects_zero_interval() {
        let config = PollerConfig {
            interval_seconds: 0,
        };
        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::ValidationError { field, .. }) = result {
            assert_eq!(field, "poller.interval_seconds");
        }
    }

    #[test]
    fn test_queue_config_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.dispatch_interval_seconds, 2);
        assert_eq!(config.max_concurrent_deliveries, 5);
        assert_eq!(config.capacity, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_queue_config_rejects_zero_concurrency() {
        let config = QueueConfig {
            max_concurrent_deliveries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_config_requires_api_key() {
        let config = ProviderConfig::default();
        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::ValidationError { field, .. }) = result {
            assert_eq!(field, "provider.api_key");
        }
    }

    #[test]
    fn test_push_config_requires_gateway_url() {
        let config = PushConfig::default();
        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::ValidationError { field, .. }) = result {
            assert_eq!(field, "push.gateway_url");
        }
    }

    #[test]
    fn test_settings_validate_success() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let toml_str = r#"
            [application]
            name = "my-app"

            [poller]
            interval_seconds = 30
        "#;

        let settings: Settings = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(settings.application.name, "my-app");
        assert_eq!(settings.poller.interval_seconds, 30);
        assert_eq!(settings.queue.dispatch_interval_seconds, 2); // default
        assert_eq!(settings.logger.level, "info"); // default
    }

    #[test]
    fn test_settings_deserialize_full() {
        let toml_str = r#"
            [application]
            name = "aerosense"
            version = "1.0.0"

            [database]
            url = "postgres://localhost/aerosense"
            max_connections = 20
            min_connections = 5
            connection_timeout = 60
            auto_migrate = true

            [logger]
            level = "debug"

            [logger.console]
            enabled = true
            colored = false

            [logger.file]
            enabled = true
            path = "logs/test.log"
            append = false
            format = "compact"

            [poller]
            interval_seconds = 45

            [queue]
            dispatch_interval_seconds = 1
            max_concurrent_deliveries = 10
            capacity = 500

            [provider]
            base_url = "https://aeroapi.example.com/v4"
            api_key = "secret"
            request_timeout_seconds = 5

            [push]
            gateway_url = "https://push.example.com/send"
            timeout_seconds = 7
        "#;

        let settings: Settings = toml::from_str(toml_str).expect("Failed to deserialize");

        assert_eq!(settings.database.max_connections, 20);
        assert!(settings.database.auto_migrate);
        assert_eq!(settings.logger.level, "debug");
        assert!(!settings.logger.console.colored);
        assert_eq!(settings.logger.file.format, "compact");
        assert_eq!(settings.poller.interval_seconds, 45);
        assert_eq!(settings.queue.dispatch_interval_seconds, 1);
        assert_eq!(settings.queue.max_concurrent_deliveries, 10);
        assert_eq!(settings.queue.capacity, 500);
        assert_eq!(settings.provider.base_url, "https://aeroapi.example.com/v4");
        assert_eq!(settings.push.gateway_url, "https://push.example.com/send");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_logger_settings_into_logger_config() {
        let settings = LoggerSettings {
            level: "debug".to_string(),
            console: ConsoleSettings {
                enabled: true,
                colored: false,
            },
            file: FileSettings::default(),
        };
        let config = settings.into_logger_config().expect("Should convert");
        assert_eq!(config.level, "debug");
        assert!(config.console.enabled);
        assert!(!config.console.colored);
        assert!(!config.file.enabled);
    }

    #[test]
    fn test_logger_settings_invalid_format() {
        let settings = LoggerSettings {
            file: FileSettings {
                format: "xml".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let result = settings.into_logger_config();
        assert!(result.is_err());
        if let Err(ConfigError::ValidationError { field, .. }) = result {
            assert_eq!(field, "logger.file.format");
        }
    }
}
