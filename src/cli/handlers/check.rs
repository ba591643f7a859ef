//! Check command handler
//!
//! Prints a summary of the loaded (and already validated) configuration.

use crate::config::{Environment, Settings, StoreBackend};
use crate::error::AppResult;

pub struct CheckCommandHandler {
    settings: Settings,
    environment: Environment,
}

impl CheckCommandHandler {
    pub fn new(settings: Settings, environment: Environment) -> Self {
        Self {
            settings,
            environment,
        }
    }

    /// Human readable summary. The database URL is never printed, since it
    /// usually carries a password.
    pub fn summary(&self) -> String {
        let app = &self.settings.application;
        let db = &self.settings.database;
        let log = &self.settings.logger;

        let mut lines = vec![
            "✓ Configuration is valid".to_string(),
            format!("  application: {} {}", app.name, app.version),
            format!("  environment: {}", self.environment.as_str()),
            format!("  backend:     {}", db.backend.as_str()),
        ];
        if db.backend == StoreBackend::Postgres {
            lines.push(format!(
                "  pool:        {}..{} connections, {}s timeout",
                db.min_connections, db.max_connections, db.connection_timeout
            ));
            lines.push(format!("  migrate:     {}", if db.auto_migrate { "on startup" } else { "manual" }));
        }
        lines.push(format!("  log level:   {}", log.level));
        if log.file.enabled {
            lines.push(format!("  log file:    {} ({})", log.file.path, log.file.format));
        }
        lines.join("\n")
    }

    pub async fn execute(&self) -> AppResult<()> {
        println!("{}", self.summary());
        Ok(())
    }
}
