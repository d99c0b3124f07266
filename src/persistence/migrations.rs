//! Forward-only schema migrations for the state database.
//!
//! Each step runs in its own transaction together with the row that records
//! it in `schema_versions`, so a crash never leaves a half-applied version.

use crate::error::{ConsoleError, Result};
use sqlx::sqlite::SqlitePool;
use tracing::info;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "console_state key/value table",
    sql: r#"
        CREATE TABLE IF NOT EXISTS console_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
    "#,
}];

fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Brings the state database up to the latest schema.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS schema_versions (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| ConsoleError::persistence(format!("Failed to create schema_versions: {e}")))?;

    let applied = applied_version(pool).await?;
    let latest = latest_version();
    if applied > latest {
        return Err(ConsoleError::persistence(format!(
            "State database schema version ({applied}) is newer than supported version ({latest})"
        )));
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        apply(pool, migration).await?;
        info!("Applied state migration v{}: {}", migration.version, migration.name);
    }

    Ok(())
}

async fn applied_version(pool: &SqlitePool) -> Result<i64> {
    let (version,): (Option<i64>,) = sqlx::query_as("SELECT MAX(version) FROM schema_versions")
        .fetch_one(pool)
        .await
        .map_err(|e| ConsoleError::persistence(format!("Failed to read schema version: {e}")))?;
    Ok(version.unwrap_or(0))
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let failed = |e: sqlx::Error| {
        ConsoleError::persistence(format!("Migration v{} failed: {e}", migration.version))
    };

    let mut tx = pool.begin().await.map_err(failed)?;
    sqlx::raw_sql(migration.sql)
        .execute(&mut *tx)
        .await
        .map_err(failed)?;
    sqlx::query("INSERT INTO schema_versions (version) VALUES (?)")
        .bind(migration.version)
        .execute(&mut *tx)
        .await
        .map_err(failed)?;
    tx.commit().await.map_err(failed)
}
