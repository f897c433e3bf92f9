//! Storage ports. The SQLite adapter in `nqbot-storage` implements all of
//! these; the core only ever talks to the traits.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::{OwnerId, OwnerStats, PhoneDetails, PhoneStatus, UserProfile};
use crate::Result;

/// Phone-number queue persistence.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Insert the number for the owner, or reset an existing one back to
    /// `waiting`. Both paths bump the owner's `total_added` counter.
    async fn enqueue(&self, owner: &OwnerId, number: &str) -> Result<()>;

    /// Delete the number. Returns whether it existed. Counters are left
    /// untouched.
    async fn dequeue(&self, owner: &OwnerId, number: &str) -> Result<bool>;

    /// Assign a status (stamping `processed_at` when it becomes `processed`
    /// and bumping the processed/rejected counters on genuine transitions).
    /// Returns `false` when the record does not exist.
    async fn set_status(
        &self,
        owner: &OwnerId,
        number: &str,
        status: PhoneStatus,
        note: Option<&str>,
    ) -> Result<bool>;

    /// The owner's numbers with their raw status labels.
    async fn list_for_owner(&self, owner: &OwnerId) -> Result<BTreeMap<String, String>>;

    /// Every number in the system, grouped by owner id.
    async fn list_all(&self) -> Result<BTreeMap<String, BTreeMap<String, String>>>;

    /// Number of records currently in the queue, across all owners and
    /// regardless of status.
    async fn queue_len(&self) -> Result<u64>;

    async fn stats_for_owner(&self, owner: &OwnerId) -> Result<OwnerStats>;

    /// Update status and/or note, creating the record (without touching the
    /// counters) if it is missing.
    async fn save_details(
        &self,
        owner: &OwnerId,
        number: &str,
        status: Option<PhoneStatus>,
        note: Option<&str>,
    ) -> Result<()>;

    async fn details(&self, owner: &OwnerId, number: &str) -> Result<Option<PhoneDetails>>;

    /// Record that a login code was forwarded to the owner, and by whom.
    /// Returns `false` when the record does not exist.
    async fn mark_code_sent(
        &self,
        owner: &OwnerId,
        number: &str,
        processor: &OwnerId,
    ) -> Result<bool>;

    /// Record the owner's accept/decline answer to a forwarded code.
    async fn record_code_response(
        &self,
        owner: &OwnerId,
        number: &str,
        accepted: bool,
    ) -> Result<bool>;
}

/// Admin roster persistence. Role rules live in `policy`, not here.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn admin_ids(&self) -> Result<Vec<String>>;

    /// Returns `false` when the id was already present.
    async fn insert_admin(&self, id: &str) -> Result<bool>;

    /// Returns `false` when the id was not present.
    async fn delete_admin(&self, id: &str) -> Result<bool>;
}

/// Boolean system settings, keyed by name.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_flag(&self, key: &str, default: bool) -> Result<bool>;
    async fn set_flag(&self, key: &str, value: bool) -> Result<()>;
}

/// User profile persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn upsert_user(&self, profile: &UserProfile) -> Result<()>;
    async fn get_user(&self, id: &OwnerId) -> Result<Option<UserProfile>>;
}
