//! SQLite persistence for the number-queue bot.
//!
//! One `SqliteStore` implements every storage port from `nqbot-core`. The
//! schema is bootstrapped on connect and the main admins and default flags
//! are seeded idempotently, so a fresh database is immediately usable.

mod admins;
mod queue;
mod settings;
mod users;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use nqbot_core::policy::MAIN_ADMIN_IDS;
use nqbot_core::settings::{MODERATOR_STATUS_KEY, WORK_STATUS_KEY};
use nqbot_core::{Error, Result};

pub struct SqliteStore {
    pool: SqlitePool,
}

pub(crate) fn db_err(e: sqlx::Error) -> Error {
    Error::Storage(e.to_string())
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and bootstrap the
    /// schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(db_err)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Fresh in-memory database, mostly for tests. A single connection keeps
    /// the database alive for the pool's lifetime.
    pub async fn in_memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(db_err)?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(db_err)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        const TABLES: &[&str] = &[
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL DEFAULT '',
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS phone_numbers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                phone_number TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'waiting',
                note TEXT,
                added_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                processed_at TEXT,
                processor_id TEXT,
                code_sent INTEGER NOT NULL DEFAULT 0,
                code_accepted INTEGER,
                UNIQUE(user_id, phone_number)
            )",
            "CREATE TABLE IF NOT EXISTS admins (
                id TEXT PRIMARY KEY,
                is_main_admin INTEGER NOT NULL DEFAULT 0,
                added_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS system_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS owner_stats (
                user_id TEXT PRIMARY KEY,
                total_added INTEGER NOT NULL DEFAULT 0,
                processed INTEGER NOT NULL DEFAULT 0,
                rejected INTEGER NOT NULL DEFAULT 0
            )",
        ];

        for ddl in TABLES {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }

        self.seed().await
    }

    async fn seed(&self) -> Result<()> {
        let now = chrono::Utc::now();

        for id in MAIN_ADMIN_IDS {
            sqlx::query(
                "INSERT INTO admins (id, is_main_admin, added_at) VALUES (?, 1, ?)
                 ON CONFLICT(id) DO UPDATE SET is_main_admin = 1",
            )
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        }

        for (key, value) in [(WORK_STATUS_KEY, true), (MODERATOR_STATUS_KEY, false)] {
            sqlx::query("INSERT OR IGNORE INTO system_settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(serde_json::to_string(&value).map_err(|e| Error::Storage(e.to_string()))?)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nqbot_core::ports::{AdminStore, SettingsStore};

    #[tokio::test]
    async fn fresh_database_is_seeded() {
        let store = SqliteStore::in_memory().await.unwrap();

        let admins = store.admin_ids().await.unwrap();
        for id in MAIN_ADMIN_IDS {
            assert!(admins.iter().any(|a| a == id), "missing seeded admin {id}");
        }

        assert!(store.get_flag(WORK_STATUS_KEY, false).await.unwrap());
        assert!(!store.get_flag(MODERATOR_STATUS_KEY, true).await.unwrap());
    }

    #[tokio::test]
    async fn init_schema_is_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.init_schema().await.unwrap();
        store.init_schema().await.unwrap();
    }
}
