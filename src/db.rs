//! Database connection utilities.
//!
//! Provides the Postgres connection pool and applies the embedded schema
//! migrations from `migrations/`.

use sqlx::{PgPool, migrate::MigrateError, postgres::PgPoolOptions};

/// Establishes a connection pool to the Postgres database at `database_url`.
pub async fn connect_pg_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    tracing::info!(max_connections, "Connected to Postgres");
    Ok(pool)
}

/// Brings the schema up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
