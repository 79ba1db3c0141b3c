//! # Database Migration System
//!
//! Migrations live in `migrations/` as `YYYYMMDDHHMMSS_description.sql` files
//! and are embedded into the binary at compile time. `sqlx` records applied
//! versions in `_sqlx_migrations` and takes an advisory lock while migrating,
//! so concurrently starting servers do not race each other.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies the embedded schema migrations
pub struct DatabaseMigrations;

impl DatabaseMigrations {
    /// Run all outstanding migrations in order
    pub async fn run_all(pool: &PgPool) -> Result<(), MigrateError> {
        MIGRATOR.run(pool).await?;
        info!(
            migrations = MIGRATOR.iter().count(),
            "Database schema is up to date"
        );
        Ok(())
    }

    pub fn migrator() -> &'static Migrator {
        &MIGRATOR
    }
}
