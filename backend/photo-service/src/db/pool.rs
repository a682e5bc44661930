//! Database connection pool management

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;

const IDLE_TIMEOUT_SECS: u64 = 600;
const MAX_LIFETIME_SECS: u64 = 1800;

/// Create a PostgreSQL pool with bounded acquire and statement timeouts
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    debug!(
        "Creating database pool: max={}, min={}, acquire_timeout={}s, statement_timeout={}ms",
        config.max_connections,
        config.min_connections,
        config.acquire_timeout_secs,
        config.statement_timeout_ms
    );

    let connect_options = PgConnectOptions::from_str(&config.url)?
        .options([("statement_timeout", config.statement_timeout_ms.to_string())]);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(IDLE_TIMEOUT_SECS))
        .max_lifetime(Duration::from_secs(MAX_LIFETIME_SECS))
        .connect_with(connect_options)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    info!("Database pool created and verified");

    Ok(pool)
}

/// Apply embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
