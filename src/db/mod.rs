//! Database connection pool module.
//!
//! Provides async PostgreSQL connection pooling using diesel_async with bb8,
//! the embedded schema migrations, and the SQL functions the stores rely on.

mod migrate;
mod pool;
pub mod sql;

pub use migrate::{MIGRATIONS, pending_migrations, run_pending_migrations};
pub use pool::{AsyncDbPool, DbConnection, establish_async_connection_pool, get_connection};
