//! Cache Statistics Module
//!
//! Tracks local-tier and remote-fallback metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Local tier performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups served by the local tier
    pub hits: u64,
    /// Lookups the local tier could not serve (absent or expired)
    pub misses: u64,
    /// Entries evicted to respect capacity
    pub evictions: u64,
    /// Entries purged because their TTL elapsed
    pub expirations: u64,
    /// Current number of entries in the local tier
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Adds `count` purged-on-expiry entries.
    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Remote Counters ==
/// Lock-free counters for calls the orchestrator makes to the remote tier.
#[derive(Debug, Default)]
pub struct RemoteCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl RemoteCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

// == Tier Stats ==
/// Snapshot of both tiers as seen by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierStats {
    /// Local tier metrics
    pub local: CacheStats,
    /// Remote lookups that returned a value
    pub remote_hits: u64,
    /// Remote lookups that reported the key absent
    pub remote_misses: u64,
    /// Remote calls that failed or were abandoned
    pub remote_errors: u64,
}

impl TierStats {
    pub fn new(local: CacheStats, remote: &RemoteCounters) -> Self {
        Self {
            local,
            remote_hits: remote.hits.load(Ordering::Relaxed),
            remote_misses: remote.misses.load(Ordering::Relaxed),
            remote_errors: remote.errors.load(Ordering::Relaxed),
        }
    }
}
