//! Multi-Tier Cache Module
//!
//! Composes the [`LocalTier`] with a shared [`RemoteStore`] behind a single
//! get/set/delete surface.
//!
//! Consistency rules:
//! - reads are served locally when possible and fall back to the remote,
//!   repopulating the local tier on a remote hit;
//! - writes go through the remote first and only reach the local tier once
//!   the remote confirmed them;
//! - deletes always invalidate the local entry, even when the remote delete
//!   fails;
//! - a remote reply never overwrites a local entry written or deleted after
//!   the remote call started.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::cache::{LocalTier, RemoteCounters, TierStats};
use crate::config::CacheConfig;
use crate::context::Context;
use crate::error::{CacheError, Result};
use crate::remote::RemoteStore;

// == Multi Cache ==
/// Two-tier cache: bounded local tier in front of a shared remote store.
///
/// The local tier is owned exclusively. The remote store is injected and
/// shared; the cache never closes it.
pub struct MultiCache<R> {
    local: LocalTier,
    remote: Arc<R>,
    local_ttl: Option<Duration>,
    counters: RemoteCounters,
}

impl<R> std::fmt::Debug for MultiCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiCache")
            .field("local", &self.local)
            .field("local_ttl", &self.local_ttl)
            .finish_non_exhaustive()
    }
}

impl<R: RemoteStore> MultiCache<R> {
    // == Constructor ==
    /// Creates a cache whose local tier holds at most `capacity` entries.
    ///
    /// `default_ttl` applies whenever an operation passes a zero TTL and to
    /// entries repopulated from the remote. Fails with
    /// [`crate::CacheError::Config`] when `capacity` or `default_ttl` is zero.
    pub fn new(capacity: usize, default_ttl: Duration, remote: Arc<R>) -> Result<Self> {
        Ok(Self {
            local: LocalTier::new(capacity, default_ttl)?,
            remote,
            local_ttl: None,
            counters: RemoteCounters::default(),
        })
    }

    /// Creates a cache from its configuration section.
    pub fn from_config(config: &CacheConfig, remote: Arc<R>) -> Result<Self> {
        let cache = Self::new(config.capacity, config.default_ttl, remote)?;
        Ok(match config.local_ttl {
            Some(ttl) => cache.with_local_ttl(ttl),
            None => cache,
        })
    }

    /// Caps how long any entry may live in the local tier.
    ///
    /// The remote keeps the full TTL, so once the local copy lapses reads
    /// fall back to the remote and re-cache the value. Zero removes the cap.
    pub fn with_local_ttl(mut self, ttl: Duration) -> Self {
        self.local_ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    fn local_lifetime(&self, ttl: Duration) -> Duration {
        match self.local_ttl {
            Some(cap) => ttl.min(cap),
            None => ttl,
        }
    }

    // == Get ==
    /// Returns the value for `key`, consulting the remote on a local miss.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.get_ctx(&Context::background(), key).await
    }

    /// [`MultiCache::get`] with the remote call bound by `ctx`.
    ///
    /// The local lookup runs regardless of the context state.
    #[instrument(skip(self, ctx, key), fields(key_len = key.len()))]
    pub async fn get_ctx(&self, ctx: &Context, key: &str) -> Result<Vec<u8>> {
        if let Some(value) = self.local.get(key) {
            debug!("Local tier hit");
            return Ok(value);
        }

        debug!("Local tier miss, consulting remote store");
        let ticket = self.local.ticket(key);
        match ctx.run(self.remote.get(key)).await {
            Ok(value) => {
                self.counters.record_hit();
                let ttl = self.local_lifetime(self.local.default_ttl());
                if self.local.fill(&ticket, value.clone(), ttl) {
                    debug!(ttl_ms = ttl.as_millis() as u64, "Remote hit, local tier repopulated");
                } else {
                    debug!("Remote hit, key written meanwhile, local tier not repopulated");
                }
                Ok(value)
            }
            Err(err) if err.is_not_found() => {
                self.counters.record_miss();
                debug!("Remote miss");
                Err(err)
            }
            Err(err) => {
                self.counters.record_error();
                warn!(error = %err, "Remote lookup failed");
                Err(err)
            }
        }
    }

    // == Set ==
    /// Writes `value` to the remote, then to the local tier.
    ///
    /// A zero `ttl` means the default TTL. Returns true when the local tier
    /// replaced a live entry.
    pub async fn set(&self, key: &str, value: impl Into<Vec<u8>>, ttl: Duration) -> Result<bool> {
        self.set_ctx(&Context::background(), key, value, ttl).await
    }

    /// [`MultiCache::set`] with the remote call bound by `ctx`.
    ///
    /// If the remote write fails the local tier is left untouched. If the
    /// context finishes first the remote outcome is unknown, so the local
    /// entry is dropped. When another write to `key` completed during the
    /// remote call the local entry is dropped as well and `false` returned.
    #[instrument(skip(self, ctx, key, value), fields(key_len = key.len()))]
    pub async fn set_ctx(
        &self,
        ctx: &Context,
        key: &str,
        value: impl Into<Vec<u8>>,
        ttl: Duration,
    ) -> Result<bool> {
        let value = value.into();
        let ttl = self.local.effective_ttl(ttl);

        // Never sent, so nothing to invalidate
        if let Some(err) = ctx.err() {
            self.counters.record_error();
            return Err(err);
        }

        let ticket = self.local.ticket(key);
        match ctx.run(self.remote.set_with_ttl(key, &value, ttl)).await {
            Ok(()) => {}
            Err(err @ (CacheError::Cancelled | CacheError::DeadlineExceeded)) => {
                self.counters.record_error();
                self.local.delete(key);
                warn!(error = %err, "Remote write abandoned, local entry invalidated");
                return Err(err);
            }
            Err(err) => {
                self.counters.record_error();
                warn!(error = %err, "Remote write failed, local tier left untouched");
                return Err(err);
            }
        }

        match self.local.commit(&ticket, value, self.local_lifetime(ttl)) {
            Some(replaced) => {
                debug!(replaced, ttl_ms = ttl.as_millis() as u64, "Value written through");
                Ok(replaced)
            }
            None => {
                debug!("Concurrent write to key, local entry invalidated");
                Ok(false)
            }
        }
    }

    // == Delete ==
    /// Removes `key` from both tiers.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.delete_ctx(&Context::background(), key).await
    }

    /// [`MultiCache::delete`] with the remote call bound by `ctx`.
    ///
    /// The local entry is invalidated even when the remote delete fails; the
    /// remote error is still returned.
    #[instrument(skip(self, ctx, key), fields(key_len = key.len()))]
    pub async fn delete_ctx(&self, ctx: &Context, key: &str) -> Result<()> {
        let remote = ctx.run(self.remote.delete(key)).await;
        self.local.delete(key);

        if let Err(err) = &remote {
            self.counters.record_error();
            warn!(error = %err, "Remote delete failed, local entry invalidated anyway");
        }
        remote
    }

    // == Ping ==
    /// Probes the remote store.
    pub async fn ping(&self) -> Result<()> {
        self.ping_ctx(&Context::background()).await
    }

    pub async fn ping_ctx(&self, ctx: &Context) -> Result<()> {
        ctx.run(self.remote.ping()).await
    }

    /// Purges expired local entries; returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        self.local.cleanup_expired()
    }

    /// Snapshot of local and remote counters.
    pub fn stats(&self) -> TierStats {
        TierStats::new(self.local.stats(), &self.counters)
    }

    pub fn local(&self) -> &LocalTier {
        &self.local
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    pub fn local_ttl(&self) -> Option<Duration> {
        self.local_ttl
    }
}
