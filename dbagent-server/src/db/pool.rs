//! Database connection pool management
//!
//! Uses sqlx MySqlPool with an explicit connection limit and a bounded
//! connect timeout.

use sqlx::mysql::{MySqlConnection, MySqlPoolOptions};
use sqlx::{Connection, MySqlPool};

use crate::config::DatabaseConfig;

/// Create a MySQL connection pool.
///
/// One direct connection is opened and closed first, so an unreachable or
/// misconfigured database fails startup instead of queueing requests.
///
/// # Errors
///
/// Returns an error if the probe connection fails.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&DatabaseConfig::default()).await?;
/// ```
pub async fn create_pool(config: &DatabaseConfig) -> Result<MySqlPool, sqlx::Error> {
    let probe = MySqlConnection::connect_with(&config.connect_options()).await?;
    probe.close().await?;

    let pool = connect_lazy(config);

    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        max_connections = config.connection_limit,
        connect_timeout_secs = config.connect_timeout.as_secs(),
        "Database connection pool created"
    );

    Ok(pool)
}

/// Build the pool without touching the server.
///
/// The acquire timeout only bounds opening a connection: sqlx retries a
/// refused connect until it expires. Waiting for a free slot is handled by
/// [`MySqlExecutor`](super::MySqlExecutor) and is unbounded.
pub fn connect_lazy(config: &DatabaseConfig) -> MySqlPool {
    MySqlPoolOptions::new()
        .max_connections(config.connection_limit)
        .acquire_timeout(config.connect_timeout)
        .connect_lazy_with(config.connect_options())
}
