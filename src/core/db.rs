use anyhow::{Context, Result, anyhow};
use diesel::{Connection, PgConnection};
use diesel_async::{AsyncPgConnection, pooled_connection::AsyncDieselConnectionManager};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::core::{aliases::DbPool, config::DatabaseConfig};

/// Migrations embedded into the binary which helps with streamlining image building process
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Builds the connection pool. Connections are opened lazily on first use.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);

    DbPool::builder()
        .max_size(config.pool_max_size)
        .connection_timeout(config.pool_timeout)
        .build(manager)
        .await
        .context("Failed to build DB connection pool")
}

/// Runs pending migrations on a dedicated synchronous connection and returns
/// how many were applied.
pub async fn run_migrations_blocking(
    migrations: EmbeddedMigrations,
    database_url: &str,
) -> Result<usize> {
    let database_url = database_url.to_string();

    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .context("Failed to connect to the database for migrations")?;

        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|err| anyhow!("Failed to run migrations: {err}"))?;

        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}
