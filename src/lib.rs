//! Multi Cache - a two-tier key-value cache
//!
//! A bounded in-process tier with TTL expiration and LRU eviction sits in
//! front of a shared remote store. Reads fall back to the remote and
//! repopulate the local tier; writes go through to the remote first.

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod remote;
pub mod tasks;

pub use api::AppState;
pub use cache::{LocalTier, MultiCache, TierStats, TypedCache};
pub use codec::{Codec, JsonCodec, RawCodec, Utf8Codec};
pub use config::{CacheConfig, Config, RemoteConfig};
pub use context::{CancelToken, Context};
pub use error::{CacheError, Result};
pub use remote::{MemoryStore, RemoteStore};
#[cfg(feature = "redis")]
pub use remote::RedisStore;
pub use tasks::spawn_cleanup_task;
