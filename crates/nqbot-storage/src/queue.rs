use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use nqbot_core::domain::{OwnerId, OwnerStats, PhoneDetails, PhoneStatus};
use nqbot_core::ports::QueueStore;
use nqbot_core::Result;

use crate::{db_err, SqliteStore};

impl SqliteStore {
    /// Users are created lazily the first time one of their numbers shows
    /// up; the profile fields stay empty until `upsert_user` fills them.
    async fn ensure_user(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        owner: &OwnerId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO users (id, created_at) VALUES (?, ?)")
            .bind(owner.as_str())
            .bind(now)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl QueueStore for SqliteStore {
    async fn enqueue(&self, owner: &OwnerId, number: &str) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await.map_err(db_err)?;

        Self::ensure_user(&mut tx, owner, now).await?;

        // Re-adding an existing number resets it to the back of the queue.
        sqlx::query(
            "INSERT INTO phone_numbers (user_id, phone_number, status, added_at, updated_at)
             VALUES (?, ?, 'waiting', ?, ?)
             ON CONFLICT(user_id, phone_number)
             DO UPDATE SET status = 'waiting', updated_at = excluded.updated_at",
        )
        .bind(owner.as_str())
        .bind(number)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        // total_added counts submissions, not distinct numbers, so the bump
        // happens on re-adds too.
        sqlx::query(
            "INSERT INTO owner_stats (user_id, total_added) VALUES (?, 1)
             ON CONFLICT(user_id) DO UPDATE SET total_added = total_added + 1",
        )
        .bind(owner.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)
    }

    async fn dequeue(&self, owner: &OwnerId, number: &str) -> Result<bool> {
        let res = sqlx::query("DELETE FROM phone_numbers WHERE user_id = ? AND phone_number = ?")
            .bind(owner.as_str())
            .bind(number)
            .execute(self.pool())
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        owner: &OwnerId,
        number: &str,
        status: PhoneStatus,
        note: Option<&str>,
    ) -> Result<bool> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await.map_err(db_err)?;

        let row =
            sqlx::query("SELECT status FROM phone_numbers WHERE user_id = ? AND phone_number = ?")
                .bind(owner.as_str())
                .bind(number)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(false);
        };
        let previous: String = row.get("status");

        sqlx::query(
            "UPDATE phone_numbers
             SET status = ?1,
                 note = COALESCE(?2, note),
                 updated_at = ?3,
                 processed_at = CASE WHEN ?1 = 'processed' THEN ?3 ELSE processed_at END
             WHERE user_id = ?4 AND phone_number = ?5",
        )
        .bind(status.as_str())
        .bind(note)
        .bind(now)
        .bind(owner.as_str())
        .bind(number)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        // Audit counters only move on a genuine transition, and never down.
        if previous != status.as_str() {
            let column = match status {
                PhoneStatus::Processed => Some("processed"),
                PhoneStatus::Rejected => Some("rejected"),
                _ => None,
            };
            if let Some(column) = column {
                sqlx::query(&format!(
                    "INSERT INTO owner_stats (user_id, {column}) VALUES (?, 1)
                     ON CONFLICT(user_id) DO UPDATE SET {column} = {column} + 1"
                ))
                .bind(owner.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(true)
    }

    async fn list_for_owner(&self, owner: &OwnerId) -> Result<BTreeMap<String, String>> {
        let rows = sqlx::query(
            "SELECT phone_number, status FROM phone_numbers WHERE user_id = ? ORDER BY added_at",
        )
        .bind(owner.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("phone_number"), row.get("status")))
            .collect())
    }

    async fn list_all(&self) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
        let rows = sqlx::query(
            "SELECT user_id, phone_number, status FROM phone_numbers ORDER BY added_at",
        )
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;

        let mut all: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for row in rows {
            all.entry(row.get("user_id"))
                .or_default()
                .insert(row.get("phone_number"), row.get("status"));
        }
        Ok(all)
    }

    async fn queue_len(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM phone_numbers")
            .fetch_one(self.pool())
            .await
            .map_err(db_err)?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn stats_for_owner(&self, owner: &OwnerId) -> Result<OwnerStats> {
        let counters = sqlx::query(
            "SELECT total_added, processed, rejected FROM owner_stats WHERE user_id = ?",
        )
        .bind(owner.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(db_err)?;

        let in_queue = sqlx::query(
            "SELECT COUNT(*) AS n FROM phone_numbers WHERE user_id = ?",
        )
        .bind(owner.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?
        .get::<i64, _>("n") as u64;

        let mut stats = OwnerStats {
            in_queue,
            ..OwnerStats::default()
        };
        if let Some(row) = counters {
            stats.total_added = row.get::<i64, _>("total_added") as u64;
            stats.processed = row.get::<i64, _>("processed") as u64;
            stats.rejected = row.get::<i64, _>("rejected") as u64;
        }
        Ok(stats)
    }

    async fn save_details(
        &self,
        owner: &OwnerId,
        number: &str,
        status: Option<PhoneStatus>,
        note: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await.map_err(db_err)?;

        Self::ensure_user(&mut tx, owner, now).await?;

        let exists =
            sqlx::query("SELECT id FROM phone_numbers WHERE user_id = ? AND phone_number = ?")
                .bind(owner.as_str())
                .bind(number)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?
                .is_some();

        if exists {
            sqlx::query(
                "UPDATE phone_numbers
                 SET status = COALESCE(?1, status),
                     note = COALESCE(?2, note),
                     updated_at = ?3,
                     processed_at = CASE WHEN ?1 = 'processed' THEN ?3 ELSE processed_at END
                 WHERE user_id = ?4 AND phone_number = ?5",
            )
            .bind(status.map(|s| s.as_str()))
            .bind(note)
            .bind(now)
            .bind(owner.as_str())
            .bind(number)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        } else {
            // Unlike enqueue, creating a record here does not count as a
            // submission, so the counters stay put.
            sqlx::query(
                "INSERT INTO phone_numbers (user_id, phone_number, status, note, added_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(owner.as_str())
            .bind(number)
            .bind(status.unwrap_or(PhoneStatus::Waiting).as_str())
            .bind(note)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)
    }

    async fn details(&self, owner: &OwnerId, number: &str) -> Result<Option<PhoneDetails>> {
        let row = sqlx::query(
            "SELECT status, note, added_at, processed_at, processor_id, code_sent, code_accepted
             FROM phone_numbers WHERE user_id = ? AND phone_number = ?",
        )
        .bind(owner.as_str())
        .bind(number)
        .fetch_optional(self.pool())
        .await
        .map_err(db_err)?;

        Ok(row.map(|row| PhoneDetails {
            status: row.get("status"),
            note: row.get("note"),
            added_at: row.get("added_at"),
            processed_at: row.get("processed_at"),
            processor_id: row.get("processor_id"),
            code_sent: row.get("code_sent"),
            code_accepted: row.get("code_accepted"),
        }))
    }

    async fn mark_code_sent(
        &self,
        owner: &OwnerId,
        number: &str,
        processor: &OwnerId,
    ) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE phone_numbers SET code_sent = 1, processor_id = ?, updated_at = ?
             WHERE user_id = ? AND phone_number = ?",
        )
        .bind(processor.as_str())
        .bind(Utc::now())
        .bind(owner.as_str())
        .bind(number)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn record_code_response(
        &self,
        owner: &OwnerId,
        number: &str,
        accepted: bool,
    ) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE phone_numbers SET code_accepted = ?, updated_at = ?
             WHERE user_id = ? AND phone_number = ?",
        )
        .bind(accepted)
        .bind(Utc::now())
        .bind(owner.as_str())
        .bind(number)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUM: &str = "+12345678901";

    fn owner() -> OwnerId {
        OwnerId("100".into())
    }

    #[tokio::test]
    async fn enqueue_shows_up_as_waiting() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.enqueue(&owner(), NUM).await.unwrap();

        let numbers = store.list_for_owner(&owner()).await.unwrap();
        assert_eq!(numbers.get(NUM).map(String::as_str), Some("waiting"));
        assert_eq!(store.queue_len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dequeue_removes_and_reports_existence() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.enqueue(&owner(), NUM).await.unwrap();

        assert!(store.dequeue(&owner(), NUM).await.unwrap());
        assert!(store.list_for_owner(&owner()).await.unwrap().is_empty());
        assert!(!store.dequeue(&owner(), NUM).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_enqueue_counts_two_submissions_for_one_record() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.enqueue(&owner(), NUM).await.unwrap();
        store
            .set_status(&owner(), NUM, PhoneStatus::Rejected, None)
            .await
            .unwrap();
        store.enqueue(&owner(), NUM).await.unwrap();

        let numbers = store.list_for_owner(&owner()).await.unwrap();
        assert_eq!(numbers.len(), 1);
        assert_eq!(numbers.get(NUM).map(String::as_str), Some("waiting"));

        let stats = store.stats_for_owner(&owner()).await.unwrap();
        assert_eq!(stats.total_added, 2);
        assert_eq!(stats.in_queue, 1);
    }

    #[tokio::test]
    async fn set_status_processed_increments_counter_once() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.enqueue(&owner(), NUM).await.unwrap();

        assert!(store
            .set_status(&owner(), NUM, PhoneStatus::Processed, None)
            .await
            .unwrap());

        let stats = store.stats_for_owner(&owner()).await.unwrap();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.in_queue, 1);

        let details = store.details(&owner(), NUM).await.unwrap().unwrap();
        assert_eq!(details.status, "processed");
        assert!(details.processed_at.is_some());

        // Same status again: no second increment.
        assert!(store
            .set_status(&owner(), NUM, PhoneStatus::Processed, None)
            .await
            .unwrap());
        let stats = store.stats_for_owner(&owner()).await.unwrap();
        assert_eq!(stats.processed, 1);
    }

    #[tokio::test]
    async fn in_queue_counts_all_current_records_regardless_of_status() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.enqueue(&owner(), NUM).await.unwrap();
        store.enqueue(&owner(), "+19876543210").await.unwrap();
        store
            .set_status(&owner(), NUM, PhoneStatus::Processed, None)
            .await
            .unwrap();

        let stats = store.stats_for_owner(&owner()).await.unwrap();
        assert_eq!(stats.in_queue, 2);
        assert_eq!(store.queue_len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn counters_survive_deletion() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.enqueue(&owner(), NUM).await.unwrap();
        store
            .set_status(&owner(), NUM, PhoneStatus::Rejected, None)
            .await
            .unwrap();
        store.dequeue(&owner(), NUM).await.unwrap();

        let stats = store.stats_for_owner(&owner()).await.unwrap();
        assert_eq!(stats.total_added, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.in_queue, 0);
    }

    #[tokio::test]
    async fn set_status_on_missing_number_reports_not_found() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(!store
            .set_status(&owner(), NUM, PhoneStatus::Processed, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn details_round_trip_including_code_flow() {
        let store = SqliteStore::in_memory().await.unwrap();
        let admin = OwnerId("200".into());

        store
            .save_details(&owner(), NUM, None, Some("Added by Jo"))
            .await
            .unwrap();

        let details = store.details(&owner(), NUM).await.unwrap().unwrap();
        assert_eq!(details.status, "waiting");
        assert_eq!(details.note.as_deref(), Some("Added by Jo"));
        assert!(!details.code_sent);
        assert_eq!(details.code_accepted, None);

        assert!(store.mark_code_sent(&owner(), NUM, &admin).await.unwrap());
        assert!(store.record_code_response(&owner(), NUM, true).await.unwrap());

        let details = store.details(&owner(), NUM).await.unwrap().unwrap();
        assert!(details.code_sent);
        assert_eq!(details.code_accepted, Some(true));
        assert_eq!(details.processor_id.as_deref(), Some("200"));
    }

    #[tokio::test]
    async fn save_details_updates_without_counting_a_submission() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.enqueue(&owner(), NUM).await.unwrap();

        store
            .save_details(&owner(), NUM, Some(PhoneStatus::Pending), Some("note"))
            .await
            .unwrap();

        let details = store.details(&owner(), NUM).await.unwrap().unwrap();
        assert_eq!(details.status, "pending");
        assert_eq!(details.note.as_deref(), Some("note"));

        let stats = store.stats_for_owner(&owner()).await.unwrap();
        assert_eq!(stats.total_added, 1);
    }

    #[tokio::test]
    async fn list_all_groups_by_owner() {
        let store = SqliteStore::in_memory().await.unwrap();
        let other = OwnerId("101".into());
        store.enqueue(&owner(), NUM).await.unwrap();
        store.enqueue(&other, "+19876543210").await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all["100"].contains_key(NUM));
        assert!(all["101"].contains_key("+19876543210"));
    }
}
