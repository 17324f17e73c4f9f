//! SQLite-backed session store. Bindings survive restarts.

use async_trait::async_trait;
use relay_core::{error::RelayError, shellexpand, traits::SessionStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Persistent channel → thread map.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `db_path`, running migrations on first use.
    pub async fn new(db_path: &str) -> Result<Self, RelayError> {
        let db_path = shellexpand(db_path);

        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RelayError::Memory(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| RelayError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| RelayError::Memory(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        let store = Self { pool };
        info!(
            "Session store initialized at {db_path} ({} bound channels)",
            store.count().await?
        );
        Ok(store)
    }

    /// Wrap an existing pool, running migrations.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, RelayError> {
        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Number of bound channels.
    pub async fn count(&self) -> Result<i64, RelayError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RelayError::Memory(format!("query failed: {e}")))?;
        Ok(count)
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), RelayError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| RelayError::Memory(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_sessions", include_str!("../migrations/001_sessions.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        RelayError::Memory(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| RelayError::Memory(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    RelayError::Memory(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn lookup(&self, channel_id: &str) -> Result<Option<String>, RelayError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT thread_id FROM sessions WHERE channel_id = ?")
                .bind(channel_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RelayError::Memory(format!("query failed: {e}")))?;

        Ok(row.map(|(thread_id,)| thread_id))
    }

    async fn bind(&self, channel_id: &str, thread_id: &str) -> Result<(), RelayError> {
        sqlx::query(
            "INSERT INTO sessions (channel_id, thread_id) VALUES (?, ?) \
             ON CONFLICT(channel_id) DO UPDATE SET thread_id = excluded.thread_id, \
             updated_at = datetime('now')",
        )
        .bind(channel_id)
        .bind(thread_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RelayError::Memory(format!("upsert session failed: {e}")))?;

        Ok(())
    }
}
