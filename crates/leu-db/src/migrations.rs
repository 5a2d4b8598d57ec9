//! # Database Migrations
//!
//! Embedded SQL migrations for the document store.
//!
//! ## Migration Files
//! ```text
//! migrations/sqlite/
//! └── 001_documents.sql      # documents table, one row per document
//! ```
//!
//! Migrations are compiled into the binary with `sqlx::migrate!`, so the
//! seed tool and the services never look for SQL files at runtime.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::DbResult;

/// Embedded migrator.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Transactional: each migration runs in a transaction
/// - Ordered: migrations run in filename order (001, 002, ...)
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)` for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
    {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "Migration table not readable, assuming none applied");
            0
        }
    };

    Ok((total, applied.max(0) as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_migrations_applied_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        // Second run is a no-op.
        run_migrations(db.pool()).await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(applied, 1);
    }

    #[tokio::test]
    async fn test_status_before_migrating() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(applied, 0);
    }
}
