use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use nqbot_core::ports::AdminStore;
use nqbot_core::Result;

use crate::{db_err, SqliteStore};

#[async_trait]
impl AdminStore for SqliteStore {
    async fn admin_ids(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT id FROM admins ORDER BY added_at, id")
            .fetch_all(self.pool())
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(|row| row.get("id")).collect())
    }

    async fn insert_admin(&self, id: &str) -> Result<bool> {
        let res = sqlx::query("INSERT OR IGNORE INTO admins (id, is_main_admin, added_at) VALUES (?, 0, ?)")
            .bind(id)
            .bind(Utc::now())
            .execute(self.pool())
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_admin(&self, id: &str) -> Result<bool> {
        let res = sqlx::query("DELETE FROM admins WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_is_idempotent_and_reports_it() {
        let store = SqliteStore::in_memory().await.unwrap();

        assert!(store.insert_admin("42").await.unwrap());
        assert!(!store.insert_admin("42").await.unwrap());

        let ids = store.admin_ids().await.unwrap();
        assert_eq!(ids.iter().filter(|id| id.as_str() == "42").count(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = SqliteStore::in_memory().await.unwrap();

        store.insert_admin("42").await.unwrap();
        assert!(store.delete_admin("42").await.unwrap());
        assert!(!store.delete_admin("42").await.unwrap());
    }
}
