//! Remote Store Module
//!
//! The narrow capability set the cache needs from a shared, networked
//! key-value store. Connection setup, topology and retries belong to whoever
//! constructs the client; the cache only calls these four operations.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

/// Operations the cache issues against the remote tier.
///
/// Adapters perform no buffering, batching or retries. Deadlines and
/// cancellation are enforced by the caller around each returned future.
pub trait RemoteStore: Send + Sync {
    /// Fetches the bytes stored under `key`.
    ///
    /// Fails with [`crate::CacheError::NotFound`] when the key is absent and
    /// [`crate::CacheError::Store`] on transport or protocol failure.
    fn get(&self, key: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Stores `value` under `key`, expiring after `ttl`.
    fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Removes `key`. Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Liveness probe.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;
}
