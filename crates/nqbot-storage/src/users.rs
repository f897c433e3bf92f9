use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use nqbot_core::domain::{OwnerId, UserProfile};
use nqbot_core::ports::UserStore;
use nqbot_core::Result;

use crate::{db_err, SqliteStore};

#[async_trait]
impl UserStore for SqliteStore {
    async fn upsert_user(&self, profile: &UserProfile) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, first_name, last_name, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
               username = excluded.username,
               first_name = excluded.first_name,
               last_name = excluded.last_name",
        )
        .bind(profile.id.as_str())
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_user(&self, id: &OwnerId) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT id, username, first_name, last_name FROM users WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;

        Ok(row.map(|row| UserProfile {
            id: OwnerId(row.get("id")),
            username: row.get("username"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = SqliteStore::in_memory().await.unwrap();
        let profile = UserProfile {
            id: OwnerId("7".into()),
            username: "seven".into(),
            first_name: "Seven".into(),
            last_name: "Nine".into(),
        };

        store.upsert_user(&profile).await.unwrap();
        assert_eq!(store.get_user(&profile.id).await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn upsert_updates_existing_profile() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut profile = UserProfile {
            id: OwnerId("7".into()),
            username: "old".into(),
            first_name: "Old".into(),
            last_name: String::new(),
        };
        store.upsert_user(&profile).await.unwrap();

        profile.username = "new".into();
        profile.first_name = "New".into();
        store.upsert_user(&profile).await.unwrap();

        let loaded = store.get_user(&profile.id).await.unwrap().unwrap();
        assert_eq!(loaded.username, "new");
        assert_eq!(loaded.first_name, "New");
    }
}
