//! Database layer for Folio.
//!
//! Provides SQLite connection pooling and query modules for accounts,
//! sessions, user documents and blob metadata.

mod blobs;
mod documents;
mod pool;
mod users;

pub use blobs::*;
pub use documents::*;
pub use pool::*;
pub use users::*;

use crate::Result;
use tracing::info;

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

/// Initialize the database connection pool.
///
/// An in-memory database gets a single connection so every query sees the
/// same data.
pub async fn init_pool(path: &str) -> Result<DbPool> {
    let config = if path == ":memory:" {
        PoolConfig::test()
    } else {
        PoolConfig::default()
    };
    let pool = create_pool_with_config(path, config).await?;

    info!("Database pool initialized: {}", path);

    Ok(pool)
}

/// Initialize the database schema.
///
/// Applies schema.sql. Uses IF NOT EXISTS clauses so it's safe to run
/// multiple times.
pub async fn initialize_schema(pool: &DbPool) -> Result<()> {
    info!("Initializing database schema");

    for statement in schema_statements(include_str!("../../schema.sql")) {
        sqlx::query(&statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully");

    Ok(())
}

/// Split a SQL script into statements.
///
/// `--` comment lines are dropped before splitting on `;`.
fn schema_statements(script: &str) -> Vec<String> {
    let without_comments = script
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    without_comments
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_string)
        .collect()
}
