//! Configuration validation logic
//!
//! Each section validates itself and reports the first offending field using
//! its dotted TOML path.

use crate::config::error::ConfigError;
use crate::config::settings::{
    ApplicationConfig, DatabaseConfig, FileSettings, LoggerSettings, Settings, StoreBackend,
};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

const VALID_URL_SCHEMES: &[&str] = &["postgres://", "postgresql://"];

impl ApplicationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::validation(
                "application.name",
                "Application name must not be empty.",
            ));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - The postgres backend requires a `postgres://` or `postgresql://` URL
    /// - Max and min connections must be greater than 0
    /// - Min connections must not exceed max connections
    /// - The memory backend ignores the URL and pool sizing
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StoreBackend::Memory {
            return Ok(());
        }

        if self.url.trim().is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required for the postgres backend.",
            ));
        }

        if !VALID_URL_SCHEMES
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "database.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// The level may be a plain level name or a full filter directive such as
    /// `warn,bazaar_rs=debug`; only the plain form is checked against the
    /// known level names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_lowercase();
        let is_directive = level.contains('=') || level.contains(',');
        if !is_directive && !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl Settings {
    /// Validate all configuration settings, returning the first error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.application.validate()?;
        self.database.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}
