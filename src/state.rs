//! Application state shared by every command.
//!
//! The store handle (connection pool or in-memory collections) is built once
//! here and injected into the services; nothing reconstructs it later.

use crate::config::{DatabaseConfig, Settings, StoreBackend};
use crate::db::{AsyncDbPool, establish_async_connection_pool, run_pending_migrations};
use crate::error::AppResult;
use crate::repositories::Repositories;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap since both Services and AsyncDbPool use Arc internally.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// The connection pool, absent for the in-memory backend
    pub db_pool: Option<AsyncDbPool>,
    pub backend: StoreBackend,
}

impl AppState {
    /// Builds the state for the configured backend.
    ///
    /// With `database.auto_migrate` set, pending migrations are applied
    /// before the pool is created and indexes are initialised afterwards.
    pub async fn from_settings(settings: &Settings) -> AppResult<Self> {
        let state = match settings.database.backend {
            StoreBackend::Postgres => Self::postgres(&settings.database).await?,
            StoreBackend::Memory => Self::in_memory(),
        };

        if settings.database.auto_migrate {
            state.initialize_indexes().await?;
        }
        tracing::info!(backend = state.backend.as_str(), "Application state ready");
        Ok(state)
    }

    async fn postgres(config: &DatabaseConfig) -> AppResult<Self> {
        if config.auto_migrate {
            let applied = run_pending_migrations(&config.url).await?;
            tracing::info!(applied = applied.len(), "Startup migrations applied");
        }

        let pool = establish_async_connection_pool(config).await?;
        Ok(Self {
            services: Services::new(Repositories::postgres(pool.clone())),
            db_pool: Some(pool),
            backend: StoreBackend::Postgres,
        })
    }

    /// State over empty process-local stores.
    pub fn in_memory() -> Self {
        Self {
            services: Services::new(Repositories::in_memory()),
            db_pool: None,
            backend: StoreBackend::Memory,
        }
    }

    /// Recreates the unique email index and ensures the article owner index.
    pub async fn initialize_indexes(&self) -> AppResult<()> {
        self.services.users.initialize_indexes().await?;
        self.services.articles.ensure_indexes().await
    }
}
