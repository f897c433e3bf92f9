//! Cached directory of user profiles.

use std::sync::Arc;

use crate::cache::{TtlCache, USER_INFO_TTL};
use crate::domain::{OwnerId, UserProfile};
use crate::ports::UserStore;
use crate::Result;

pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    cache: TtlCache<OwnerId, Option<UserProfile>>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            cache: TtlCache::new(10_000, USER_INFO_TTL),
        }
    }

    pub async fn save(&self, profile: &UserProfile) -> Result<()> {
        self.store.upsert_user(profile).await?;
        self.cache.invalidate(&profile.id).await;
        Ok(())
    }

    /// Look up a profile (cached). Unknown ids and storage failures both
    /// come back as `None`; failures are logged.
    pub async fn get(&self, id: &OwnerId) -> Option<UserProfile> {
        let store = self.store.clone();
        let key = id.clone();
        let loaded = self
            .cache
            .get_or_try_compute(id.clone(), async move { store.get_user(&key).await })
            .await;
        match loaded {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(id = %id, error = %e, "user lookup failed");
                None
            }
        }
    }

    /// Display name for an id, falling back to the bare id when the profile
    /// is unknown.
    pub async fn display_name(&self, id: &OwnerId) -> String {
        match self.get(id).await {
            Some(profile) => profile.display_name(),
            None => format!("ID: {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct MemUsers {
        users: Mutex<HashMap<String, UserProfile>>,
    }

    #[async_trait]
    impl UserStore for MemUsers {
        async fn upsert_user(&self, profile: &UserProfile) -> Result<()> {
            self.users
                .lock()
                .unwrap()
                .insert(profile.id.0.clone(), profile.clone());
            Ok(())
        }

        async fn get_user(&self, id: &OwnerId) -> Result<Option<UserProfile>> {
            Ok(self.users.lock().unwrap().get(id.as_str()).cloned())
        }
    }

    #[tokio::test]
    async fn save_invalidates_cached_profile() {
        let dir = UserDirectory::new(Arc::new(MemUsers::default()));
        let id = OwnerId("7".into());

        // Warm the cache with a miss.
        assert!(dir.get(&id).await.is_none());

        let profile = UserProfile {
            id: id.clone(),
            username: "seven".into(),
            first_name: "Seven".into(),
            last_name: String::new(),
        };
        dir.save(&profile).await.unwrap();

        assert_eq!(dir.get(&id).await, Some(profile));
        assert_eq!(dir.display_name(&id).await, "Seven (@seven)");
    }
}
