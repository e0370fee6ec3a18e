//! # Database Migrations
//!
//! Embedded SQL migrations, applied in filename order and tracked in the
//! `_sqlx_migrations` table. Idempotent: safe to run on every startup.
//!
//! ## Adding New Migrations
//! 1. Create a new file in `migrations/` with the next sequence number
//!    (`NNNN_description.sql`)
//! 2. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 3. Never modify an applied migration, always add a new one

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations embedded from the `migrations/` directory at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Runs all pending database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("all migrations applied");
    Ok(())
}

/// Returns (total embedded migrations, applied migrations) for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
