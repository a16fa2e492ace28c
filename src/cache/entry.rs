//! Cache Entry Module
//!
//! Defines the structure for individual local-tier entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

/// Lifetime substituted when `now + ttl` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Expiry instant `ttl` after `now`, saturating for very large TTLs.
pub(crate) fn expiry_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

// == Cache Entry ==
/// A single local-tier entry: opaque value bytes plus expiry metadata.
///
/// Timestamps come from [`tokio::time::Instant`], which follows the runtime
/// clock when one is driving the current thread and falls back to the
/// monotonic system clock otherwise.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Vec<u8>,
    /// Creation (or last refresh) instant
    pub created_at: Instant,
    /// Instant from which the entry is considered absent
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` from now.
    pub fn new(value: Vec<u8>, ttl: Duration) -> Self {
        let now = Instant::now();

        Self {
            value,
            created_at: now,
            expires_at: expiry_after(now, ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is greater
    /// than or equal to its expiration instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, saturating at zero.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
