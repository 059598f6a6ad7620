//! Persistence adapters
//!
//! SQLite (sqlx) adapters for players, reference data, settings and the audit
//! table, plus in-memory adapters with true per-player locks for tests and
//! embedded callers.

mod esprit_catalog;
mod memory;
mod player_repository;
mod settings_repository;

pub use esprit_catalog::SqliteEspritCatalog;
pub use memory::{InMemoryEspritCatalog, InMemoryPlayerRepository, InMemorySettingsRepository};
pub use player_repository::{SqlitePlayerRepository, SqliteUnitOfWork};
pub use settings_repository::SqliteSettingsRepository;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use crate::application::ports::outbound::RepositoryError;
use crate::domain::value_objects::Element;

/// Owns the connection pool and the schema
#[derive(Clone)]
pub struct SqlitePersistence {
    pool: SqlitePool,
}

impl SqlitePersistence {
    /// Open the database. Lock waits (busy timeout and pool acquire) are
    /// bounded by `lock_timeout`.
    pub async fn connect(url: &str, max_connections: u32, lock_timeout: Duration) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true)
            .busy_timeout(lock_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(lock_timeout)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite")?;

        Self::from_pool(pool).await.context("Failed to initialize schema")
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn players(&self) -> SqlitePlayerRepository {
        SqlitePlayerRepository::new(self.pool.clone())
    }

    pub fn catalog(&self) -> SqliteEspritCatalog {
        SqliteEspritCatalog::new(self.pool.clone())
    }

    pub async fn settings(&self) -> Result<SqliteSettingsRepository, sqlx::Error> {
        SqliteSettingsRepository::new(self.pool.clone()).await
    }
}

async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            level INTEGER NOT NULL DEFAULT 1,
            experience INTEGER NOT NULL DEFAULT 0,
            jijies INTEGER NOT NULL DEFAULT 0,
            total_jijies_earned INTEGER NOT NULL DEFAULT 0,
            inventory_json TEXT NOT NULL DEFAULT '{}',
            daily_streak INTEGER NOT NULL DEFAULT 0,
            last_daily_reward TEXT,
            last_active TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS esprit_bases (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            element TEXT NOT NULL,
            base_tier INTEGER NOT NULL,
            base_atk INTEGER NOT NULL,
            base_def INTEGER NOT NULL,
            base_hp INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS esprits (
            id TEXT PRIMARY KEY,
            esprit_base_id TEXT NOT NULL REFERENCES esprit_bases(id),
            owner_id TEXT NOT NULL REFERENCES players(id),
            quantity INTEGER NOT NULL DEFAULT 1,
            tier INTEGER NOT NULL,
            awakening_level INTEGER NOT NULL DEFAULT 0,
            element TEXT NOT NULL,
            created_at TEXT NOT NULL,
            last_modified TEXT NOT NULL,
            UNIQUE (owner_id, esprit_base_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transaction_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            amount INTEGER NOT NULL,
            old_balance INTEGER,
            new_balance INTEGER,
            streak INTEGER,
            source TEXT NOT NULL,
            details_json TEXT NOT NULL,
            occurred_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_transaction_log_player
        ON transaction_log(player_id, occurred_at)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Split lock contention (BUSY / LOCKED / pool exhaustion) from other failures
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    let busy = match &err {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| matches!(code & 0xff, 5 | 6))
            .unwrap_or(false),
        _ => false,
    };

    if busy {
        RepositoryError::Conflict(err.to_string())
    } else {
        RepositoryError::Database(err.to_string())
    }
}

pub(crate) fn encode_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339()
}

pub(crate) fn decode_time(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Database(format!("Invalid datetime '{}': {}", value, e)))
}

pub(crate) fn decode_element(value: &str) -> Result<Element, RepositoryError> {
    Element::from_name(value)
        .ok_or_else(|| RepositoryError::Database(format!("Unknown element '{}'", value)))
}

/// Typed column read with repository error mapping
pub(crate) fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name).map_err(map_sqlx_error)
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // One connection: every connection to sqlite::memory: is a separate database
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .acquire_timeout(Duration::from_millis(200))
        .connect("sqlite::memory:")
        .await
        .unwrap()
}
