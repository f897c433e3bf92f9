//! Global boolean flags gating the bot's behavior.
//!
//! `work_status` gates every submission path; `moderator_status` is shown to
//! users so they know whether a moderator is on duty. Reads are cached for
//! at most 30 seconds and writers invalidate synchronously.

use std::sync::Arc;

use crate::cache::{TtlCache, SETTINGS_TTL};
use crate::ports::SettingsStore;
use crate::Result;

pub const WORK_STATUS_KEY: &str = "work_status";
pub const MODERATOR_STATUS_KEY: &str = "moderator_status";

pub struct SettingsFlags {
    store: Arc<dyn SettingsStore>,
    cache: TtlCache<&'static str, bool>,
}

impl SettingsFlags {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            cache: TtlCache::new(8, SETTINGS_TTL),
        }
    }

    /// Whether submissions are open. Defaults to open when the flag cannot
    /// be read.
    pub async fn work_status(&self) -> bool {
        self.flag(WORK_STATUS_KEY, true).await
    }

    pub async fn set_work_status(&self, value: bool) -> Result<()> {
        self.set_flag(WORK_STATUS_KEY, value).await
    }

    /// Whether a moderator is marked on duty. Defaults to off.
    pub async fn moderator_status(&self) -> bool {
        self.flag(MODERATOR_STATUS_KEY, false).await
    }

    pub async fn set_moderator_status(&self, value: bool) -> Result<()> {
        self.set_flag(MODERATOR_STATUS_KEY, value).await
    }

    async fn flag(&self, key: &'static str, default: bool) -> bool {
        let store = self.store.clone();
        let loaded = self
            .cache
            .get_or_try_compute(key, async move { store.get_flag(key, default).await })
            .await;
        match loaded {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(key, error = %e, "settings flag unavailable, using default");
                default
            }
        }
    }

    async fn set_flag(&self, key: &'static str, value: bool) -> Result<()> {
        self.store.set_flag(key, value).await?;
        self.cache.invalidate(&key).await;
        Ok(())
    }
}
