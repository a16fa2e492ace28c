//! Cache Module
//!
//! The bounded local tier, the multi-tier orchestrator and its typed
//! front-end.

mod entry;
mod local;
mod lru;
mod multi;
mod stats;
mod typed;


// Re-export public types
pub(crate) use entry::expiry_after;
pub use entry::CacheEntry;
pub use local::{LocalTier, WriteTicket};
pub(crate) use lru::LruTracker;
pub use multi::MultiCache;
pub use stats::{CacheStats, RemoteCounters, TierStats};
pub use typed::TypedCache;

// == Public Constants ==
/// Maximum key length accepted by the HTTP surface, in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum value size accepted by the HTTP surface, in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Longest TTL accepted by the HTTP surface, in seconds (ten years)
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;
