//! Connection pool setup and schema migrations for the SQLite store.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Opens a pool for `database_url`.
///
/// Foreign keys are always enabled; cascade rules in the schema depend on them.
/// An in-memory database lives only as long as its connection, so those pools are
/// pinned to a single connection that is never recycled.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    pool_options.connect_with(options).await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations applied");
    Ok(())
}

/// Fresh, migrated in-memory store. Used by the test suites.
pub async fn connect_in_memory() -> Result<SqlitePool, crate::error::AppError> {
    let pool = connect("sqlite::memory:", 1).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
