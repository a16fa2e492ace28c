//! TTL Cleanup Task
//!
//! Background task that periodically purges expired local-tier entries.
//! Reads already expire entries lazily; the sweep only reclaims memory held
//! by keys nobody asks for again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MultiCache;
use crate::remote::RemoteStore;

/// Spawns a task sweeping `cache`'s local tier every `cleanup_interval_secs`.
///
/// The task runs until aborted through the returned handle.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(MultiCache::new(1000, Duration::from_secs(300), remote)?);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<R>(
    cache: Arc<MultiCache<R>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()>
where
    R: RemoteStore + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;

    fn cache() -> Arc<MultiCache<MemoryStore>> {
        let remote = Arc::new(MemoryStore::new());
        Arc::new(MultiCache::new(100, Duration::from_secs(300), remote).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = cache();
        cache
            .set("expire_soon", "value", Duration::from_secs(1))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1);

        tokio::time::sleep(Duration::from_millis(2500)).await;

        // Swept without any read touching it
        assert_eq!(cache.local().len(), 0);
        assert_eq!(cache.stats().local.expirations, 1);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = cache();
        cache
            .set("long_lived", "value", Duration::from_secs(3600))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.local().peek("long_lived"), Some(b"value".to_vec()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(cache(), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
