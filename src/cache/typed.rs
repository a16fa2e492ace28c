//! Typed cache front-end: runs values through a [`Codec`] before and after
//! the byte-level [`MultiCache`].

use std::sync::Arc;
use std::time::Duration;

use crate::cache::MultiCache;
use crate::codec::Codec;
use crate::context::Context;
use crate::error::Result;
use crate::remote::RemoteStore;

/// A [`MultiCache`] storing `C::Value`s.
///
/// Encoding happens before any tier is touched, so an encode failure leaves
/// both tiers unchanged. Several typed views may share one cache.
#[derive(Debug)]
pub struct TypedCache<C, R> {
    cache: Arc<MultiCache<R>>,
    codec: C,
}

impl<C: Codec, R: RemoteStore> TypedCache<C, R> {
    pub fn new(cache: Arc<MultiCache<R>>, codec: C) -> Self {
        Self { cache, codec }
    }

    pub fn inner(&self) -> &MultiCache<R> {
        &self.cache
    }

    /// The shared byte-level cache, e.g. for background maintenance.
    pub fn shared(&self) -> &Arc<MultiCache<R>> {
        &self.cache
    }

    pub async fn get(&self, key: &str) -> Result<C::Value> {
        self.get_ctx(&Context::background(), key).await
    }

    pub async fn get_ctx(&self, ctx: &Context, key: &str) -> Result<C::Value> {
        let bytes = self.cache.get_ctx(ctx, key).await?;
        self.codec.decode(&bytes)
    }

    pub async fn set(&self, key: &str, value: &C::Value, ttl: Duration) -> Result<bool> {
        self.set_ctx(&Context::background(), key, value, ttl).await
    }

    pub async fn set_ctx(
        &self,
        ctx: &Context,
        key: &str,
        value: &C::Value,
        ttl: Duration,
    ) -> Result<bool> {
        let bytes = self.codec.encode(value)?;
        self.cache.set_ctx(ctx, key, bytes, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.cache.delete(key).await
    }

    pub async fn delete_ctx(&self, ctx: &Context, key: &str) -> Result<()> {
        self.cache.delete_ctx(ctx, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use crate::codec::{JsonCodec, Utf8Codec};
    use crate::error::CacheError;
    use crate::remote::MemoryStore;

    const TTL: Duration = Duration::from_secs(60);

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        roles: Vec<String>,
    }

    fn cache<C: Codec>(codec: C) -> (TypedCache<C, MemoryStore>, Arc<MemoryStore>) {
        let remote = Arc::new(MemoryStore::new());
        let multi = MultiCache::new(16, TTL, remote.clone()).unwrap();
        (TypedCache::new(Arc::new(multi), codec), remote)
    }

    #[tokio::test]
    async fn test_json_values_roundtrip() {
        let (cache, _) = cache(JsonCodec::<Session>::new());
        let session = Session {
            user: "ada".to_string(),
            roles: vec!["admin".to_string()],
        };

        cache.set("s:1", &session, TTL).await.unwrap();
        assert_eq!(cache.get("s:1").await.unwrap(), session);
    }

    #[tokio::test]
    async fn test_encode_failure_touches_no_tier() {
        let (cache, remote) = cache(JsonCodec::<HashMap<Vec<u8>, u8>>::new());
        let mut value = HashMap::new();
        value.insert(vec![1u8], 1u8);

        let result = cache.set("bad", &value, TTL).await;

        assert!(matches!(result, Err(CacheError::Encode(_))));
        assert_eq!(remote.set_calls(), 0);
        assert!(cache.inner().local().peek("bad").is_none());
    }

    #[tokio::test]
    async fn test_decode_failure_is_propagated() {
        let (cache, remote) = cache(Utf8Codec);
        remote.set_with_ttl("raw", &[0xff, 0xfe], TTL).await.unwrap();

        assert!(matches!(cache.get("raw").await, Err(CacheError::Decode(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_value() {
        let (cache, _) = cache(Utf8Codec);
        cache.set("k", &"v".to_string(), TTL).await.unwrap();
        cache.delete("k").await.unwrap();

        assert!(cache.get("k").await.unwrap_err().is_not_found());
    }
}
