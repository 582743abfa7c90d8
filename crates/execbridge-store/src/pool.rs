use anyhow::{Context, Result};
use execbridge_config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Build the bounded connection pool described in §5 ("DB connection pool
/// is bounded, default max 20").
pub async fn connect(cfg: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_pool_size)
        .acquire_timeout(cfg.connection_timeout)
        .max_lifetime(cfg.max_lifetime)
        .connect(&cfg.url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

/// Run the embedded `execution` table migration.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("execution store migration failed")?;
    Ok(())
}
