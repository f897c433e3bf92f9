use std::{future::Future, hash::Hash, time::Duration};

use moka::future::Cache;

use crate::{errors::Error, Result};

/// Staleness bound for the settings flags.
pub const SETTINGS_TTL: Duration = Duration::from_secs(30);
/// Staleness bound for the admin id list.
pub const ADMIN_IDS_TTL: Duration = Duration::from_secs(60);
/// Staleness bound for user profiles.
pub const USER_INFO_TTL: Duration = Duration::from_secs(300);

/// Read-through cache with explicit invalidation.
///
/// The TTL is only an upper bound on staleness. Every writer must call
/// `invalidate` after a successful write so the next read observes the new
/// value immediately instead of waiting out the TTL.
pub struct TtlCache<K, V> {
    inner: Cache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Returns the cached value or computes it with `load`. Successful loads
    /// are cached; failed loads are not, so the next read retries.
    pub async fn get_or_try_compute<F>(&self, key: K, load: F) -> Result<V>
    where
        F: Future<Output = Result<V>>,
    {
        self.inner
            .try_get_with(key, load)
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }

    pub async fn invalidate(&self, key: &K) {
        self.inner.invalidate(key).await;
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn caches_successful_loads() {
        let cache: TtlCache<&str, u32> = TtlCache::new(16, Duration::from_secs(60));
        let loads = AtomicU32::new(0);

        for _ in 0..3 {
            let v = cache
                .get_or_try_compute("k", async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(v, 7);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_recompute() {
        let cache: TtlCache<&str, u32> = TtlCache::new(16, Duration::from_secs(60));

        let v = cache.get_or_try_compute("k", async { Ok(1) }).await.unwrap();
        assert_eq!(v, 1);

        cache.invalidate(&"k").await;

        let v = cache.get_or_try_compute("k", async { Ok(2) }).await.unwrap();
        assert_eq!(v, 2);
    }

    #[tokio::test]
    async fn failed_loads_are_not_cached() {
        let cache: TtlCache<&str, u32> = TtlCache::new(16, Duration::from_secs(60));

        let err = cache
            .get_or_try_compute("k", async { Err(Error::Storage("down".into())) })
            .await;
        assert!(err.is_err());

        let v = cache.get_or_try_compute("k", async { Ok(3) }).await.unwrap();
        assert_eq!(v, 3);
    }
}
