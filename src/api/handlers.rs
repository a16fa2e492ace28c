//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint. Every remote call
//! made on behalf of a request is bounded by the configured remote timeout.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::cache::{MultiCache, TypedCache};
use crate::codec::Utf8Codec;
use crate::config::Config;
use crate::context::Context;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::remote::RemoteStore;

/// Application state shared across all handlers.
pub struct AppState<R> {
    /// String-valued view over the shared two-tier cache
    pub cache: Arc<TypedCache<Utf8Codec, R>>,
    /// Deadline for remote calls made while serving one request
    pub remote_timeout: Duration,
}

// Derived Clone would require `R: Clone`.
impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            remote_timeout: self.remote_timeout,
        }
    }
}

impl<R: RemoteStore> AppState<R> {
    /// Creates a new AppState serving `cache` as UTF-8 strings.
    pub fn new(cache: Arc<MultiCache<R>>, remote_timeout: Duration) -> Self {
        Self {
            cache: Arc::new(TypedCache::new(cache, Utf8Codec)),
            remote_timeout,
        }
    }

    /// Creates a new AppState from configuration and a connected remote.
    pub fn from_config(config: &Config, remote: Arc<R>) -> Result<Self> {
        let cache = MultiCache::from_config(&config.cache, remote)?;
        Ok(Self::new(Arc::new(cache), config.remote.timeout))
    }

    /// The byte-level cache behind the string view.
    pub fn multi(&self) -> &Arc<MultiCache<R>> {
        self.cache.shared()
    }

    fn context(&self) -> Context {
        Context::with_timeout(self.remote_timeout)
    }
}

/// Handler for PUT /set
///
/// Writes through to the remote store, then caches locally.
pub async fn set_handler<R: RemoteStore>(
    State(state): State<AppState<R>>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let replaced = state
        .cache
        .set_ctx(&state.context(), &req.key, &req.value, req.ttl())
        .await?;

    Ok(Json(SetResponse::new(req.key, replaced)))
}

/// Handler for GET /get/:key
pub async fn get_handler<R: RemoteStore>(
    State(state): State<AppState<R>>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state.cache.get_ctx(&state.context(), &key).await?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler<R: RemoteStore>(
    State(state): State<AppState<R>>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.cache.delete_ctx(&state.context(), &key).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /stats
pub async fn stats_handler<R: RemoteStore>(
    State(state): State<AppState<R>>,
) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.multi().stats()))
}

/// Handler for GET /health
///
/// Healthy only while the remote store answers pings.
pub async fn health_handler<R: RemoteStore>(
    State(state): State<AppState<R>>,
) -> Result<Json<HealthResponse>> {
    state.multi().ping_ctx(&state.context()).await?;
    debug!("Remote store answered ping");

    Ok(Json(HealthResponse::healthy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;

    const TIMEOUT: Duration = Duration::from_millis(500);

    fn test_state() -> (AppState<MemoryStore>, Arc<MemoryStore>) {
        let remote = Arc::new(MemoryStore::new());
        let cache = MultiCache::new(100, Duration::from_secs(300), remote.clone()).unwrap();
        (AppState::new(Arc::new(cache), TIMEOUT), remote)
    }

    fn set_request(key: &str, value: &str) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value: value.to_string(),
            ttl: None,
        }
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let (state, remote) = test_state();

        let request = set_request("test_key", "test_value");
        let response = set_handler(State(state.clone()), Json(request))
            .await
            .unwrap();
        assert!(!response.replaced);
        assert_eq!(remote.peek("test_key"), Some(b"test_value".to_vec()));

        let response = get_handler(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let (state, _) = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let (state, remote) = test_state();

        set_handler(State(state.clone()), Json(set_request("to_delete", "value")))
            .await
            .unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());
        assert!(remote.peek("to_delete").is_none());

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let (state, _) = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.remote_errors, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let (state, remote) = test_state();

        let response = health_handler(State(state.clone())).await.unwrap();
        assert_eq!(response.status, "healthy");

        remote.fail_pings(true);
        let result = health_handler(State(state)).await;
        assert!(matches!(result, Err(CacheError::Store(_))));
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let (state, remote) = test_state();

        let result = set_handler(State(state), Json(set_request("", "value"))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
        assert_eq!(remote.set_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_remote_hits_deadline() {
        let (state, remote) = test_state();
        remote.set_latency(Some(TIMEOUT * 2));

        let result = get_handler(State(state), Path("slow".to_string())).await;
        assert!(matches!(result, Err(CacheError::DeadlineExceeded)));
    }
}
