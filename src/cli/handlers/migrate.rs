//! Migrate command handler
//!
//! Applies (or lists) the embedded migrations, then initialises indexes.

use crate::config::{Settings, StoreBackend};
use crate::db::{pending_migrations, run_pending_migrations};
use crate::error::AppResult;
use crate::state::AppState;

/// Handler for the migrate command
pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the migrate command
    ///
    /// # Arguments
    /// * `dry_run` - If true, lists pending migrations without applying them
    ///
    /// # Errors
    /// - Database connection errors
    /// - Migration execution errors
    /// - Configuration validation errors
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        self.config.database.validate()?;

        if self.config.database.backend == StoreBackend::Memory {
            println!("In-memory backend: nothing to migrate");
            return Ok(());
        }

        if dry_run {
            return self.show_pending_migrations().await;
        }

        self.run_migrations().await?;
        self.initialize_indexes().await
    }

    async fn show_pending_migrations(&self) -> AppResult<()> {
        println!("Checking for pending migrations...");
        let pending = pending_migrations(&self.config.database.url).await?;

        if pending.is_empty() {
            println!("✓ No pending migrations found - database is up to date");
        } else {
            println!("Found {} pending migration(s):", pending.len());
            for migration in &pending {
                println!("  - {migration}");
            }
            println!("\nRun without --dry-run to apply these migrations");
        }
        Ok(())
    }

    async fn run_migrations(&self) -> AppResult<()> {
        println!("Running database migrations...");
        let applied = run_pending_migrations(&self.config.database.url).await?;

        if applied.is_empty() {
            println!("✓ No migrations to apply - database is already up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            for migration in &applied {
                println!("  - {migration}");
            }
        }
        Ok(())
    }

    async fn initialize_indexes(&self) -> AppResult<()> {
        let mut settings = self.config.clone();
        // Migrations already ran above
        settings.database.auto_migrate = false;

        AppState::from_settings(&settings)
            .await?
            .initialize_indexes()
            .await?;
        println!("✓ Indexes initialised");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_handler_new() {
        let config = Settings::default();
        let handler = MigrateCommandHandler::new(config.clone());
        assert_eq!(handler.config(), &config);
    }

    #[tokio::test]
    async fn test_memory_backend_has_nothing_to_migrate() {
        let mut config = Settings::default();
        config.database.backend = StoreBackend::Memory;

        assert!(MigrateCommandHandler::new(config).execute(false).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_database_config_is_rejected() {
        let mut config = Settings::default();
        config.database.url = "mysql://localhost/bazaar".to_string();

        let result = MigrateCommandHandler::new(config).execute(true).await;
        assert!(matches!(
            result,
            Err(crate::error::AppError::Configuration { .. })
        ));
    }
}
