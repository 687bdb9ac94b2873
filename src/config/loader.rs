//! Configuration loader for aerosense
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from multiple sources with proper precedence.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "AEROSENSE_CONFIG_DIR";

/// Environment variable for specific configuration file
const CONFIG_FILE_ENV: &str = "AEROSENSE_CONFIG_FILE";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "AEROSENSE";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Configuration loader that handles layered configuration loading
///
/// The loader supports the following configuration sources (in order of priority):
/// 1. `default.toml` - Base default configuration (required)
/// 2. `{environment}.toml` - Environment-specific configuration (optional)
/// 3. `local.toml` - Local development overrides (optional)
/// 4. `AEROSENSE_*` environment variables (highest priority)
#[derive(Debug)]
pub struct ConfigLoader {
    /// Configuration directory path
    config_dir: PathBuf,
    /// Specific configuration file path (if set, skips layered loading)
    config_file: Option<PathBuf>,
    /// Current application environment
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a new configuration loader
    ///
    /// This reads environment variables to determine:
    /// - Configuration directory (`AEROSENSE_CONFIG_DIR`)
    /// - Specific configuration file (`AEROSENSE_CONFIG_FILE`)
    /// - Application environment (`AEROSENSE_APP_ENV`)
    ///
    /// # Errors
    ///
    /// Returns an error if both `AEROSENSE_CONFIG_DIR` and `AEROSENSE_CONFIG_FILE`
    /// are set, as they are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && std::env::var(CONFIG_DIR_ENV).is_ok() {
            return Err(ConfigError::mutual_exclusivity(
                "AEROSENSE_CONFIG_DIR and AEROSENSE_CONFIG_FILE cannot both be set. \
                 Use AEROSENSE_CONFIG_DIR for layered configuration or \
                 AEROSENSE_CONFIG_FILE for a single configuration file.",
            ));
        }

        let environment = AppEnvironment::from_env();

        Ok(Self {
            config_dir,
            config_file,
            environment,
        })
    }

    /// Get the current application environment
    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Load configuration from all sources
    ///
    /// If `AEROSENSE_CONFIG_FILE` is set, loads only that file.
    /// Otherwise, performs layered loading from the configuration directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `default.toml` is not found (when using layered loading)
    /// - Configuration parsing fails
    /// - Configuration validation fails
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Build the config::Config instance from all sources
    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = if let Some(ref config_file) = self.config_file {
            // Single file mode
            self.add_file_source(builder, config_file, true)?
        } else {
            // Layered loading mode
            self.build_layered_config(builder)?
        };

        // Environment variables are always highest priority:
        // AEROSENSE_POLLER__INTERVAL_SECONDS -> poller.interval_seconds
        let builder = Self::add_env_source(builder);

        builder.build().map_err(ConfigError::from)
    }

    /// Build layered configuration from multiple files
    fn build_layered_config(
        &self,
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        // 1. Add default.toml (required)
        let default_path = self.config_dir.join("default.toml");
        let builder = self.add_file_source(builder, &default_path, true)?;

        // 2. Add {environment}.toml (optional)
        let env_path = self
            .config_dir
            .join(format!("{}.toml", self.environment.as_str()));
        let builder = self.add_file_source(builder, &env_path, false)?;

        // 3. Add local.toml (optional)
        let local_path = self.config_dir.join("local.toml");
        let builder = self.add_file_source(builder, &local_path, false)?;

        Ok(builder)
    }

    /// Add a file source to the config builder
    fn add_file_source(
        &self,
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(
            File::new(path.to_str().unwrap_or_default(), FileFormat::Toml).required(required),
        ))
    }

    /// Add environment variable source to the config builder
    ///
    /// Environment variables with prefix `AEROSENSE_` are mapped to configuration
    /// keys. Double underscores (`__`) are used as separators for nested keys.
    fn add_env_source(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> config::ConfigBuilder<config::builder::DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Global mutex to ensure tests run sequentially to avoid env var conflicts
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    const VALID_DEFAULT: &str = r#"
[database]
url = "postgres://localhost/aerosense"

[provider]
api_key = "test-key"

[push]
gateway_url = "https://push.example.com/send"
"#;

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            let path = temp_dir.path().join(name);
            fs::write(&path, content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Helper to safely set environment variables for a test
    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self {
                vars_to_restore: Vec::new(),
            }
        }

        fn set(&mut self, key: &str, value: &str) {
            let original = std::env::var(key).ok();
            self.vars_to_restore.push((key.to_string(), original));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            let original = std::env::var(key).ok();
            self.vars_to_restore.push((key.to_string(), original));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in &self.vars_to_restore {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_loader_new_default() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        env.remove("AEROSENSE_CONFIG_DIR");
        env.remove("AEROSENSE_CONFIG_FILE");
        env.remove("AEROSENSE_APP_ENV");

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.config_dir, PathBuf::from("config"));
        assert!(loader.config_file.is_none());
        assert_eq!(loader.environment, AppEnvironment::Development);
    }

    #[test]
    fn test_config_loader_mutual_exclusivity_error() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        env.set("AEROSENSE_CONFIG_DIR", "/custom/config");
        env.set("AEROSENSE_CONFIG_FILE", "/path/to/config.toml");

        let result = ConfigLoader::new();
        assert!(result.is_err());
        assert!(matches!(
            result,
            Err(ConfigError::MutualExclusivityError(_))
        ));
    }

    #[test]
    fn test_load_missing_default_toml() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let temp_dir = setup_config_dir(&[]);

        env.set("AEROSENSE_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.remove("AEROSENSE_CONFIG_FILE");
        env.remove("AEROSENSE_APP_ENV");

        let loader = ConfigLoader::new().expect("Should create loader");
        let result = loader.load();

        assert!(result.is_err());
        if let Err(ConfigError::FileNotFound(msg)) = result {
            assert!(msg.contains("default.toml"));
        } else {
            panic!("Expected FileNotFound error");
        }
    }

    #[test]
    fn test_load_default_toml_only() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let temp_dir = setup_config_dir(&[("default.toml", VALID_DEFAULT)]);

        env.set("AEROSENSE_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.remove("AEROSENSE_CONFIG_FILE");
        env.remove("AEROSENSE_APP_ENV");

        let loader = ConfigLoader::new().expect("Should create loader");
        let settings = loader.load().expect("Should load settings");

        assert_eq!(settings.database.url, "postgres://localhost/aerosense");
        assert_eq!(settings.poller.interval_seconds, 60);
    }

    #[test]
    fn test_load_with_environment_override() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let production_config = r#"
[poller]
interval_seconds = 120

[queue]
max_concurrent_deliveries = 10
"#;

        let temp_dir = setup_config_dir(&[
            ("default.toml", VALID_DEFAULT),
            ("production.toml", production_config),
        ]);

        env.set("AEROSENSE_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.remove("AEROSENSE_CONFIG_FILE");
        env.set("AEROSENSE_APP_ENV", "production");

        let loader = ConfigLoader::new().expect("Should create loader");
        let settings = loader.load().expect("Should load settings");

        // Values from production.toml override default.toml
        assert_eq!(settings.poller.interval_seconds, 120);
        assert_eq!(settings.queue.max_concurrent_deliveries, 10);

        // Values not in production.toml come from default.toml
        assert_eq!(settings.database.url, "postgres://localhost/aerosense");
        assert_eq!(settings.queue.dispatch_interval_seconds, 2);
    }

    #[test]
    fn test_load_with_env_var_override() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let temp_dir = setup_config_dir(&[("default.toml", VALID_DEFAULT)]);

        env.set("AEROSENSE_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.remove("AEROSENSE_CONFIG_FILE");
        env.remove("AEROSENSE_APP_ENV");

        env.set("AEROSENSE_POLLER__INTERVAL_SECONDS", "15");
        env.set("AEROSENSE_DATABASE__URL", "postgres://env-override/db");

        let loader = ConfigLoader::new().expect("Should create loader");
        let settings = loader.load().expect("Should load settings");

        assert_eq!(settings.poller.interval_seconds, 15);
        assert_eq!(settings.database.url, "postgres://env-override/db");
    }

    #[test]
    fn test_load_rejects_invalid_settings() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        // database.url is missing, so validation must fail before startup
        let invalid_default = r#"
[provider]
api_key = "test-key"

[push]
gateway_url = "https://push.example.com/send"
"#;

        let temp_dir = setup_config_dir(&[("default.toml", invalid_default)]);

        env.set("AEROSENSE_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.remove("AEROSENSE_CONFIG_FILE");
        env.remove("AEROSENSE_APP_ENV");

        let loader = ConfigLoader::new().expect("Should create loader");
        let result = loader.load();

        assert!(result.is_err());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_load_single_file_mode() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let temp_dir = setup_config_dir(&[("single.toml", VALID_DEFAULT)]);
        let config_file_path = temp_dir.path().join("single.toml");

        env.remove("AEROSENSE_CONFIG_DIR");
        env.set("AEROSENSE_CONFIG_FILE", config_file_path.to_str().unwrap());
        env.remove("AEROSENSE_APP_ENV");

        let loader = ConfigLoader::new().expect("Should create loader");
        let settings = loader.load().expect("Should load settings");

        assert_eq!(settings.database.url, "postgres://localhost/aerosense");
    }
}
