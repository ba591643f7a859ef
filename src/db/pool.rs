//! Async database connection pool implementation.
//!
//! Uses bb8 connection pool manager with diesel_async for PostgreSQL connections.

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Async connection pool type alias.
///
/// bb8::Pool internally uses Arc, so Clone is cheap (just reference count increment).
/// Structures holding AsyncDbPool can derive Clone without additional Arc wrapping.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// A connection checked out of [`AsyncDbPool`]
pub type DbConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

/// Creates an async database connection pool sized from `config`.
///
/// The pool is built once at start-up and shared by every store.
///
/// # Errors
///
/// - `AppError::ConnectionPool` - If the initial connections cannot be established
///
/// # Example
///
/// ```ignore
/// let pool = establish_async_connection_pool(&settings.database).await?;
/// let mut conn = get_connection(&pool).await?;
/// ```
pub async fn establish_async_connection_pool(config: &DatabaseConfig) -> AppResult<AsyncDbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str());

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(config.connection_timeout())
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool {
            source: anyhow::Error::from(e),
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool established"
    );
    Ok(pool)
}

/// Checks a connection out of the pool.
pub async fn get_connection(pool: &AsyncDbPool) -> AppResult<DbConnection<'_>> {
    pool.get().await.map_err(|e| AppError::ConnectionPool {
        source: anyhow::Error::from(e),
    })
}
