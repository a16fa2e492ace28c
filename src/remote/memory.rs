//! In-process remote store.
//!
//! Behaves like a shared TTL key-value server: entries expire on the store's
//! own clock and any holder of the `Arc` may write to the same keyspace. Used
//! by the service when no networked store is configured, and by tests, which
//! can inject failures and latency and count calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use super::RemoteStore;
use crate::cache::expiry_after;
use crate::error::{CacheError, Result};

#[derive(Debug, Default)]
struct Faults {
    reads: AtomicBool,
    writes: AtomicBool,
    deletes: AtomicBool,
    pings: AtomicBool,
}

#[derive(Debug, Default)]
struct CallCounts {
    gets: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    pings: AtomicU64,
}

/// TTL-expiring key-value store living in this process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (Vec<u8>, Instant)>>,
    latency: Mutex<Option<Duration>>,
    faults: Faults,
    calls: CallCounts,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `latency` before it takes effect.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Makes `get` fail with a store error while enabled.
    pub fn fail_reads(&self, enabled: bool) {
        self.faults.reads.store(enabled, Ordering::SeqCst);
    }

    /// Makes `set_with_ttl` fail with a store error while enabled.
    pub fn fail_writes(&self, enabled: bool) {
        self.faults.writes.store(enabled, Ordering::SeqCst);
    }

    /// Makes `delete` fail with a store error while enabled.
    pub fn fail_deletes(&self, enabled: bool) {
        self.faults.deletes.store(enabled, Ordering::SeqCst);
    }

    /// Makes `ping` fail with a store error while enabled.
    pub fn fail_pings(&self, enabled: bool) {
        self.faults.pings.store(enabled, Ordering::SeqCst);
    }

    /// Number of `get` calls received.
    pub fn get_calls(&self) -> u64 {
        self.calls.gets.load(Ordering::SeqCst)
    }

    /// Number of `set_with_ttl` calls received.
    pub fn set_calls(&self) -> u64 {
        self.calls.sets.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls received.
    pub fn delete_calls(&self) -> u64 {
        self.calls.deletes.load(Ordering::SeqCst)
    }

    /// Number of `ping` calls received.
    pub fn ping_calls(&self) -> u64 {
        self.calls.pings.load(Ordering::SeqCst)
    }

    /// Reads a live value without counting a call or applying faults.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(value, _)| value.clone())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|(_, expires_at)| now < *expires_at)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(CacheError::Store(format!("injected {} failure", op)));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.calls.gets.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        Self::check(&self.faults.reads, "read")?;

        let now = Instant::now();
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some((value, expires_at)) if now < *expires_at => Ok(value.clone()),
            Some(_) => {
                entries.remove(key);
                Err(CacheError::NotFound(key.to_string()))
            }
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.calls.sets.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        Self::check(&self.faults.writes, "write")?;

        if ttl.is_zero() {
            return Err(CacheError::Store("TTL must be positive".to_string()));
        }
        self.entries
            .write()
            .insert(key.to_string(), (value.to_vec(), expiry_after(Instant::now(), ttl)));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.calls.deletes.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        Self::check(&self.faults.deletes, "delete")?;

        self.entries.write().remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.calls.pings.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        Self::check(&self.faults.pings, "ping")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", b"v", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap(), b"v");
        assert_eq!(store.get_calls(), 1);
        assert_eq!(store.set_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_absent_is_not_found() {
        let store = MemoryStore::new();
        assert_eq!(
            store.get("missing").await,
            Err(CacheError::NotFound("missing".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", b"v", Duration::from_secs(5))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;

        assert!(store.get("k").await.unwrap_err().is_not_found());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_absent_succeeds() {
        let store = MemoryStore::new();
        assert!(store.delete("missing").await.is_ok());
        assert_eq!(store.delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        store.fail_reads(true);
        store.fail_deletes(true);
        store.fail_pings(true);

        assert!(matches!(
            store.set_with_ttl("k", b"v", Duration::from_secs(1)).await,
            Err(CacheError::Store(_))
        ));
        assert!(matches!(store.get("k").await, Err(CacheError::Store(_))));
        assert!(matches!(store.delete("k").await, Err(CacheError::Store(_))));
        assert!(matches!(store.ping().await, Err(CacheError::Store(_))));
        assert!(store.peek("k").is_none());

        store.fail_pings(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set_with_ttl("k", b"v", Duration::ZERO).await,
            Err(CacheError::Store(_))
        ));
    }
}
