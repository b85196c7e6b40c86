//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `lumend.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Schedule evaluator settings.
    pub scheduler: SchedulerConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Schedule evaluator configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between evaluation ticks, `1..=60`. Above 60 a schedule's
    /// matching minute could pass between ticks.
    pub tick_seconds: u64,
    /// Deadline for each storage call made by the transition engine, in
    /// milliseconds.
    pub storage_timeout_ms: u64,
}

impl Config {
    /// Load configuration from `lumend.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("lumend.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LUMEN_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("LUMEN_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("LUMEN_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("LUMEN_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("LUMEN_TICK_SECONDS") {
            if let Ok(secs) = val.parse() {
                self.scheduler.tick_seconds = secs;
            }
        }
        if let Ok(val) = std::env::var("LUMEN_STORAGE_TIMEOUT_MS") {
            if let Ok(millis) = val.parse() {
                self.scheduler.storage_timeout_ms = millis;
            }
        }
        if let Ok(val) = std::env::var("LUMEN_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.scheduler.tick_seconds == 0 || self.scheduler.tick_seconds > 60 {
            return Err(ConfigError::Validation(format!(
                "tick_seconds must be in 1..=60, got {}",
                self.scheduler.tick_seconds
            )));
        }
        if self.scheduler.storage_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "storage_timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Interval between schedule evaluation ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.tick_seconds)
    }

    /// Deadline for engine storage calls.
    #[must_use]
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.scheduler.storage_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:lumen.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "lumend=info,lumen=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 30,
            storage_timeout_ms: 5000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:lumen.db?mode=rwc");
        assert_eq!(config.scheduler.tick_seconds, 30);
        assert_eq!(config.scheduler.storage_timeout_ms, 5000);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let toml = "";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [scheduler]
            tick_seconds = 10
            storage_timeout_ms = 1000
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.scheduler.tick_seconds, 10);
        assert_eq!(config.scheduler.storage_timeout_ms, 1000);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_tick() {
        let mut config = Config::default();
        config.scheduler.tick_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_tick_above_one_minute() {
        let mut config = Config::default();
        config.scheduler.tick_seconds = 61;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_boundary_ticks() {
        let mut config = Config::default();
        config.scheduler.tick_seconds = 1;
        assert!(config.validate().is_ok());
        config.scheduler.tick_seconds = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_storage_timeout() {
        let mut config = Config::default();
        config.scheduler.storage_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_format_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn should_format_custom_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_convert_scheduler_fields_to_durations() {
        let config = Config::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(30));
        assert_eq!(config.storage_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [scheduler]
            tick_seconds = 5
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scheduler.tick_seconds, 5);
        assert_eq!(config.scheduler.storage_timeout_ms, 5000);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
