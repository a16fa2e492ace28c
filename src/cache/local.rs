//! Local Tier Module
//!
//! Bounded in-process cache combining HashMap storage with LRU tracking and
//! lazy TTL expiration. All operations take `&self`; state sits behind a
//! single mutex so an entry is either fully present or fully absent.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::error::{CacheError, Result};

/// Write stamp shared by every open [`WriteTicket`] on one key.
#[derive(Debug)]
struct Pending {
    stamp: u64,
    holders: usize,
}

#[derive(Debug)]
struct LocalState {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    stats: CacheStats,
    pending: HashMap<String, Pending>,
    next_stamp: u64,
}

impl LocalState {
    fn purge(&mut self, key: &str) {
        self.entries.remove(key);
        self.lru.remove(key);
        self.stats.record_expirations(1);
        self.stats.set_total_entries(self.entries.len());
    }

    /// Marks a completed write to `key`, invalidating its open tickets.
    fn bump(&mut self, key: &str) {
        self.next_stamp += 1;
        if let Some(pending) = self.pending.get_mut(key) {
            pending.stamp = self.next_stamp;
        }
    }

    fn stamp_matches(&self, ticket: &WriteTicket<'_>) -> bool {
        self.pending
            .get(&ticket.key)
            .is_some_and(|pending| pending.stamp == ticket.stamp)
    }

    fn insert(&mut self, capacity: usize, key: &str, value: Vec<u8>, ttl: Duration) -> bool {
        let replaced = match self.entries.get(key).map(|existing| !existing.is_expired()) {
            Some(live) => live,
            None => {
                if self.entries.len() >= capacity {
                    if let Some(evicted) = self.lru.evict_oldest() {
                        self.entries.remove(&evicted);
                        self.stats.record_eviction();
                        debug!(evicted_len = evicted.len(), "Evicted least recently used entry");
                    }
                }
                false
            }
        };

        self.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        self.lru.touch(key);
        self.stats.set_total_entries(self.entries.len());
        debug_assert_eq!(self.lru.len(), self.entries.len());

        replaced
    }

    fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }
}

// == Write Ticket ==
/// Claim on a key taken before a remote call whose result will be copied
/// into the local tier.
///
/// Any [`LocalTier::set`], [`LocalTier::delete`] or committed ticket on the
/// same key completing after the claim was taken invalidates it, so a slow
/// remote reply can never overwrite a newer local state.
#[derive(Debug)]
pub struct WriteTicket<'a> {
    tier: &'a LocalTier,
    key: String,
    stamp: u64,
}

impl Drop for WriteTicket<'_> {
    fn drop(&mut self) {
        let mut state = self.tier.state.lock();
        if let Some(pending) = state.pending.get_mut(&self.key) {
            pending.holders -= 1;
            if pending.holders == 0 {
                state.pending.remove(&self.key);
            }
        }
    }
}

// == Local Tier ==
/// Size-bounded, per-entry-TTL cache with least-recently-used eviction.
#[derive(Debug)]
pub struct LocalTier {
    state: Mutex<LocalState>,
    capacity: usize,
    default_ttl: Duration,
}

impl LocalTier {
    // == Constructor ==
    /// Creates a tier holding at most `capacity` entries.
    ///
    /// Fails with [`CacheError::Config`] when `capacity` or `default_ttl` is zero.
    pub fn new(capacity: usize, default_ttl: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::Config("capacity must be positive".to_string()));
        }
        if default_ttl.is_zero() {
            return Err(CacheError::Config("default TTL must be positive".to_string()));
        }

        Ok(Self {
            state: Mutex::new(LocalState {
                entries: HashMap::with_capacity(capacity.min(4096)),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
                pending: HashMap::new(),
                next_stamp: 0,
            }),
            capacity,
            default_ttl,
        })
    }

    // == Get ==
    /// Returns a copy of the value for `key` if present and unexpired.
    ///
    /// An expired entry is purged as a side effect. A hit makes the key the
    /// most recently used.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = Instant::now();

        match state.entries.get(key).map(|entry| entry.is_expired_at(now)) {
            None => {
                state.stats.record_miss();
                None
            }
            Some(true) => {
                state.purge(key);
                state.stats.record_miss();
                debug!(key_len = key.len(), "Local entry expired on read");
                None
            }
            Some(false) => {
                let value = state.entries.get(key).map(|entry| entry.value.clone());
                state.stats.record_hit();
                state.lru.touch(key);
                value
            }
        }
    }

    // == Peek ==
    /// Like [`LocalTier::get`] but without recency, stats or purge side effects.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let state = self.state.lock();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl` (zero means the default TTL).
    ///
    /// Replacing an existing key refreshes its value, expiry and recency
    /// without counting as an insertion. Inserting a new key at capacity
    /// evicts the least recently used entry first.
    ///
    /// Returns true when an unexpired entry was replaced.
    pub fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> bool {
        let ttl = self.effective_ttl(ttl);
        let mut state = self.state.lock();
        state.bump(key);
        state.insert(self.capacity, key, value, ttl)
    }

    // == Delete ==
    /// Removes `key` unconditionally; returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut state = self.state.lock();
        state.bump(key);
        state.remove(key)
    }

    // == Tickets ==
    /// Claims `key` ahead of a remote call.
    ///
    /// Tickets taken while no write to `key` completed in between share a
    /// stamp; the first one committed invalidates the rest.
    pub fn ticket(&self, key: &str) -> WriteTicket<'_> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let stamp = match state.pending.get_mut(key) {
            Some(pending) => {
                pending.holders += 1;
                pending.stamp
            }
            None => {
                state.next_stamp += 1;
                state.pending.insert(
                    key.to_string(),
                    Pending {
                        stamp: state.next_stamp,
                        holders: 1,
                    },
                );
                state.next_stamp
            }
        };

        WriteTicket {
            tier: self,
            key: key.to_string(),
            stamp,
        }
    }

    /// Caches a value read from the remote, unless a write to the key
    /// completed since `ticket` was taken.
    ///
    /// Returns whether the value was stored.
    pub fn fill(&self, ticket: &WriteTicket<'_>, value: Vec<u8>, ttl: Duration) -> bool {
        let ttl = self.effective_ttl(ttl);
        let mut state = self.state.lock();
        if !state.stamp_matches(ticket) {
            return false;
        }
        state.insert(self.capacity, &ticket.key, value, ttl);
        true
    }

    /// Applies a write the remote has confirmed.
    ///
    /// If another write to the key completed since `ticket` was taken, the
    /// order of the two remote writes is unknown and the local entry is
    /// dropped instead; the next read fetches whichever value the remote
    /// kept. Returns `Some(replaced)` when the value was stored.
    pub fn commit(
        &self,
        ticket: &WriteTicket<'_>,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Option<bool> {
        let ttl = self.effective_ttl(ttl);
        let mut state = self.state.lock();
        let current = state.stamp_matches(ticket);
        state.bump(&ticket.key);
        if current {
            Some(state.insert(self.capacity, &ticket.key, value, ttl))
        } else {
            state.remove(&ticket.key);
            None
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = Instant::now();

        let expired_keys: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            state.entries.remove(key);
            state.lru.remove(key);
        }

        state.stats.record_expirations(expired_keys.len());
        state.stats.set_total_entries(state.entries.len());
        expired_keys.len()
    }

    // == Stats ==
    /// Returns a snapshot of the tier's statistics.
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats.clone()
    }

    /// Resolves a caller TTL, substituting the default for zero.
    pub fn effective_ttl(&self, ttl: Duration) -> Duration {
        if ttl.is_zero() {
            self.default_ttl
        } else {
            ttl
        }
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
