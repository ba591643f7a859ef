//! Embedded schema migrations.
//!
//! diesel's migration harness is synchronous, so migrations run on a plain
//! `PgConnection` inside `spawn_blocking`.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::error::{AppError, AppResult};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn establish(database_url: &str, operation: &str) -> AppResult<PgConnection> {
    PgConnection::establish(database_url).map_err(|e| AppError::Database {
        operation: operation.to_string(),
        source: anyhow::anyhow!("Connection error: {}", e),
    })
}

async fn run_blocking<T, F>(task: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?
}

/// Names of the embedded migrations not yet applied.
pub async fn pending_migrations(database_url: &str) -> AppResult<Vec<String>> {
    let database_url = database_url.to_string();
    run_blocking(move || {
        let mut conn = establish(&database_url, "establish connection for migration check")?;
        let pending = conn
            .pending_migrations(MIGRATIONS)
            .map_err(|e| AppError::Database {
                operation: "check pending migrations".to_string(),
                source: anyhow::anyhow!("Migration error: {}", e),
            })?;
        Ok(pending.iter().map(|m| m.name().to_string()).collect())
    })
    .await
}

/// Applies every pending migration and returns the applied versions.
pub async fn run_pending_migrations(database_url: &str) -> AppResult<Vec<String>> {
    let database_url = database_url.to_string();
    let applied = run_blocking(move || {
        let mut conn = establish(&database_url, "establish connection for migrations")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| AppError::Database {
                operation: "run pending migrations".to_string(),
                source: anyhow::anyhow!("Migration error: {}", e),
            })?;
        Ok(applied.iter().map(|m| m.to_string()).collect::<Vec<_>>())
    })
    .await?;

    tracing::info!(applied = applied.len(), "Database migrations finished");
    Ok(applied)
}
