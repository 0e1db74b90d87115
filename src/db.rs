use anyhow::Context;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Opens a connection pool against the given SQLite URL, creating the database file if
/// it does not exist yet, and brings the schema up to date.
pub async fn connect_sqlx(db_url: &str) -> Result<SqlitePool, anyhow::Error> {
    let options = SqliteConnectOptions::from_str(db_url)
        .with_context(|| format!("parsing database URL {db_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(2))
        .connect_with(options)
        .await
        .context("connecting to the database")?;

    migrate(&pool).await?;
    info!("Connected to database");

    Ok(pool)
}

/// Creates a pool over a private in-memory database. The pool holds exactly one connection
/// forever since the database disappears once its last connection closes.
pub async fn connect_in_memory() -> Result<SqlitePool, anyhow::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .context("parsing in-memory database URL")?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("opening in-memory database")?;

    migrate(&pool).await?;

    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<(), anyhow::Error> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("applying database migrations")?;

    Ok(())
}
