//! Role-based access: anonymous users, admins, main admins.
//!
//! Main admins are a compiled-in allowlist. They cannot be demoted or
//! removed through any runtime path, even if their stored roster row says
//! otherwise.

use std::sync::Arc;

use crate::cache::{TtlCache, ADMIN_IDS_TTL};
use crate::domain::OwnerId;
use crate::errors::Error;
use crate::ports::AdminStore;
use crate::Result;

/// Owners of the deployment. Seeded into the roster at startup, but the
/// allowlist here is authoritative for role checks.
pub const MAIN_ADMIN_IDS: [&str; 2] = ["1235561237", "7527380558"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessLevel {
    Anonymous,
    Admin,
    MainAdmin,
}

impl AccessLevel {
    pub fn is_admin(&self) -> bool {
        matches!(self, AccessLevel::Admin | AccessLevel::MainAdmin)
    }
}

pub fn is_main_admin(id: &OwnerId) -> bool {
    MAIN_ADMIN_IDS.contains(&id.as_str())
}

pub struct AccessPolicy {
    store: Arc<dyn AdminStore>,
    cache: TtlCache<(), Vec<String>>,
}

impl AccessPolicy {
    pub fn new(store: Arc<dyn AdminStore>) -> Self {
        Self {
            store,
            cache: TtlCache::new(1, ADMIN_IDS_TTL),
        }
    }

    /// Current roster (cached). Main admins are seeded into the roster, so
    /// they show up here too.
    pub async fn admin_ids(&self) -> Result<Vec<String>> {
        let store = self.store.clone();
        self.cache
            .get_or_try_compute((), async move { store.admin_ids().await })
            .await
    }

    /// Classify a caller. Fails closed: if the roster cannot be loaded, the
    /// caller is anonymous (main admins are still recognized from the
    /// allowlist).
    pub async fn classify(&self, id: &OwnerId) -> AccessLevel {
        if is_main_admin(id) {
            return AccessLevel::MainAdmin;
        }
        match self.admin_ids().await {
            Ok(ids) if ids.iter().any(|a| a == id.as_str()) => AccessLevel::Admin,
            Ok(_) => AccessLevel::Anonymous,
            Err(e) => {
                tracing::error!(id = %id, error = %e, "admin roster unavailable");
                AccessLevel::Anonymous
            }
        }
    }

    /// Grant admin access. `AlreadyExists` when the id is already on the
    /// roster.
    pub async fn add_admin(&self, id: &OwnerId) -> Result<()> {
        let inserted = self.store.insert_admin(id.as_str()).await?;
        if !inserted {
            return Err(Error::AlreadyExists(format!("admin {id}")));
        }
        self.cache.invalidate(&()).await;
        Ok(())
    }

    /// Revoke admin access. `Forbidden` for main admins, `NotFound` when the
    /// id is not on the roster.
    pub async fn remove_admin(&self, id: &OwnerId) -> Result<()> {
        if is_main_admin(id) {
            return Err(Error::Forbidden(format!("main admin {id}")));
        }
        let removed = self.store.delete_admin(id.as_str()).await?;
        if !removed {
            return Err(Error::NotFound(format!("admin {id}")));
        }
        self.cache.invalidate(&()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct MemRoster {
        ids: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AdminStore for MemRoster {
        async fn admin_ids(&self) -> Result<Vec<String>> {
            Ok(self.ids.lock().unwrap().clone())
        }

        async fn insert_admin(&self, id: &str) -> Result<bool> {
            let mut ids = self.ids.lock().unwrap();
            if ids.iter().any(|a| a == id) {
                return Ok(false);
            }
            ids.push(id.to_string());
            Ok(true)
        }

        async fn delete_admin(&self, id: &str) -> Result<bool> {
            let mut ids = self.ids.lock().unwrap();
            let before = ids.len();
            ids.retain(|a| a != id);
            Ok(ids.len() != before)
        }
    }

    #[tokio::test]
    async fn classification_levels() {
        let policy = AccessPolicy::new(Arc::new(MemRoster::default()));

        let main = OwnerId(MAIN_ADMIN_IDS[0].to_string());
        assert_eq!(policy.classify(&main).await, AccessLevel::MainAdmin);

        let stranger = OwnerId("999".into());
        assert_eq!(policy.classify(&stranger).await, AccessLevel::Anonymous);
    }

    #[tokio::test]
    async fn add_admin_is_visible_immediately_despite_cache() {
        let policy = AccessPolicy::new(Arc::new(MemRoster::default()));
        let id = OwnerId("555".into());

        // Warm the cache with an empty roster.
        assert_eq!(policy.classify(&id).await, AccessLevel::Anonymous);

        policy.add_admin(&id).await.unwrap();
        assert_eq!(policy.classify(&id).await, AccessLevel::Admin);

        policy.remove_admin(&id).await.unwrap();
        assert_eq!(policy.classify(&id).await, AccessLevel::Anonymous);
    }

    #[tokio::test]
    async fn adding_twice_reports_already_exists() {
        let policy = AccessPolicy::new(Arc::new(MemRoster::default()));
        let id = OwnerId("555".into());

        policy.add_admin(&id).await.unwrap();
        let err = policy.add_admin(&id).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn main_admins_can_never_be_removed() {
        let roster = Arc::new(MemRoster::default());
        // Even with a stored roster row, removal is refused.
        roster.insert_admin(MAIN_ADMIN_IDS[1]).await.unwrap();

        let policy = AccessPolicy::new(roster);
        let id = OwnerId(MAIN_ADMIN_IDS[1].to_string());
        let err = policy.remove_admin(&id).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn removing_unknown_admin_reports_not_found() {
        let policy = AccessPolicy::new(Arc::new(MemRoster::default()));
        let err = policy.remove_admin(&OwnerId("777".into())).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
