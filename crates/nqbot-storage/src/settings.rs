use async_trait::async_trait;
use sqlx::Row;

use nqbot_core::ports::SettingsStore;
use nqbot_core::{Error, Result};

use crate::{db_err, SqliteStore};

// Values are stored as JSON to stay readable next to data written by older
// deployments.
#[async_trait]
impl SettingsStore for SqliteStore {
    async fn get_flag(&self, key: &str, default: bool) -> Result<bool> {
        let row = sqlx::query("SELECT value FROM system_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(default);
        };
        let raw: String = row.get("value");
        Ok(serde_json::from_str(&raw).unwrap_or(default))
    }

    async fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        let raw = serde_json::to_string(&value).map_err(|e| Error::Storage(e.to_string()))?;
        sqlx::query(
            "INSERT INTO system_settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(raw)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
