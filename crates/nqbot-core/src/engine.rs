//! Queue operations over the storage port.
//!
//! This is the storage error boundary: read paths log the failure and
//! degrade to empty/zero results so a flaky database never takes a handler
//! down, while write paths surface `Error::Storage` for the handler to
//! render as a generic failure message.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{OwnerId, OwnerStats, PhoneDetails, PhoneStatus};
use crate::errors::Error;
use crate::ports::QueueStore;
use crate::Result;

#[derive(Clone)]
pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
}

impl QueueEngine {
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self { store }
    }

    /// Add (or re-add) a number. Returns whether the write went through.
    pub async fn enqueue(&self, owner: &OwnerId, number: &str) -> bool {
        match self.store.enqueue(owner, number).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(owner = %owner, number, error = %e, "enqueue failed");
                false
            }
        }
    }

    /// Remove a number. Returns whether it existed (false as well on a
    /// storage failure).
    pub async fn dequeue(&self, owner: &OwnerId, number: &str) -> bool {
        match self.store.dequeue(owner, number).await {
            Ok(existed) => existed,
            Err(e) => {
                tracing::error!(owner = %owner, number, error = %e, "dequeue failed");
                false
            }
        }
    }

    /// Assign a status to an existing record.
    pub async fn set_status(
        &self,
        owner: &OwnerId,
        number: &str,
        status: PhoneStatus,
        note: Option<&str>,
    ) -> Result<()> {
        match self.store.set_status(owner, number, status, note).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::NotFound(format!("{number} for owner {owner}"))),
            Err(e) => {
                tracing::error!(owner = %owner, number, error = %e, "set_status failed");
                Err(e)
            }
        }
    }

    pub async fn list_for_owner(&self, owner: &OwnerId) -> BTreeMap<String, String> {
        match self.store.list_for_owner(owner).await {
            Ok(map) => map,
            Err(e) => {
                tracing::error!(owner = %owner, error = %e, "list_for_owner failed");
                BTreeMap::new()
            }
        }
    }

    pub async fn list_all(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        match self.store.list_all().await {
            Ok(map) => map,
            Err(e) => {
                tracing::error!(error = %e, "list_all failed");
                BTreeMap::new()
            }
        }
    }

    pub async fn queue_len(&self) -> u64 {
        match self.store.queue_len().await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "queue_len failed");
                0
            }
        }
    }

    pub async fn stats(&self, owner: &OwnerId) -> OwnerStats {
        match self.store.stats_for_owner(owner).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(owner = %owner, error = %e, "stats failed");
                OwnerStats::default()
            }
        }
    }

    pub async fn save_details(
        &self,
        owner: &OwnerId,
        number: &str,
        status: Option<PhoneStatus>,
        note: Option<&str>,
    ) -> bool {
        match self.store.save_details(owner, number, status, note).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(owner = %owner, number, error = %e, "save_details failed");
                false
            }
        }
    }

    pub async fn details(&self, owner: &OwnerId, number: &str) -> Option<PhoneDetails> {
        match self.store.details(owner, number).await {
            Ok(details) => details,
            Err(e) => {
                tracing::error!(owner = %owner, number, error = %e, "details failed");
                None
            }
        }
    }

    pub async fn mark_code_sent(&self, owner: &OwnerId, number: &str, processor: &OwnerId) -> bool {
        match self.store.mark_code_sent(owner, number, processor).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(owner = %owner, number, error = %e, "mark_code_sent failed");
                false
            }
        }
    }

    pub async fn record_code_response(&self, owner: &OwnerId, number: &str, accepted: bool) -> bool {
        match self.store.record_code_response(owner, number, accepted).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(owner = %owner, number, error = %e, "record_code_response failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    /// A store where every call fails, to pin the degraded behavior.
    struct BrokenStore;

    fn down<T>() -> Result<T> {
        Err(Error::Storage("database is down".into()))
    }

    #[async_trait]
    impl QueueStore for BrokenStore {
        async fn enqueue(&self, _: &OwnerId, _: &str) -> Result<()> {
            down()
        }
        async fn dequeue(&self, _: &OwnerId, _: &str) -> Result<bool> {
            down()
        }
        async fn set_status(
            &self,
            _: &OwnerId,
            _: &str,
            _: PhoneStatus,
            _: Option<&str>,
        ) -> Result<bool> {
            down()
        }
        async fn list_for_owner(&self, _: &OwnerId) -> Result<BTreeMap<String, String>> {
            down()
        }
        async fn list_all(&self) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
            down()
        }
        async fn queue_len(&self) -> Result<u64> {
            down()
        }
        async fn stats_for_owner(&self, _: &OwnerId) -> Result<OwnerStats> {
            down()
        }
        async fn save_details(
            &self,
            _: &OwnerId,
            _: &str,
            _: Option<PhoneStatus>,
            _: Option<&str>,
        ) -> Result<()> {
            down()
        }
        async fn details(&self, _: &OwnerId, _: &str) -> Result<Option<PhoneDetails>> {
            down()
        }
        async fn mark_code_sent(&self, _: &OwnerId, _: &str, _: &OwnerId) -> Result<bool> {
            down()
        }
        async fn record_code_response(&self, _: &OwnerId, _: &str, _: bool) -> Result<bool> {
            down()
        }
    }

    #[tokio::test]
    async fn storage_failures_degrade_instead_of_propagating() {
        let engine = QueueEngine::new(Arc::new(BrokenStore));
        let owner = OwnerId("1".into());

        assert!(!engine.enqueue(&owner, "+12345678901").await);
        assert!(!engine.dequeue(&owner, "+12345678901").await);
        assert!(engine.list_for_owner(&owner).await.is_empty());
        assert!(engine.list_all().await.is_empty());
        assert_eq!(engine.queue_len().await, 0);
        assert_eq!(engine.stats(&owner).await, OwnerStats::default());
        assert!(engine.details(&owner, "+12345678901").await.is_none());
    }

    #[tokio::test]
    async fn set_status_surfaces_storage_errors_as_values() {
        let engine = QueueEngine::new(Arc::new(BrokenStore));
        let owner = OwnerId("1".into());

        let err = engine
            .set_status(&owner, "+12345678901", PhoneStatus::Processed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
