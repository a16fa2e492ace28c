//! API Routes
//!
//! Configures the Axum router with all cache service endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, set_handler, stats_handler, AppState,
};
use crate::remote::RemoteStore;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a key-value pair in both tiers
/// - `GET /get/:key` - Retrieve a value, falling back to the remote store
/// - `DELETE /del/:key` - Delete a key from both tiers
/// - `GET /stats` - Get local and remote tier statistics
/// - `GET /health` - Health check, pings the remote store
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router<R>(state: AppState<R>) -> Router
where
    R: RemoteStore + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler::<R>))
        .route("/get/:key", get(get_handler::<R>))
        .route("/del/:key", delete(delete_handler::<R>))
        .route("/stats", get(stats_handler::<R>))
        .route("/health", get(health_handler::<R>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::cache::MultiCache;
    use crate::remote::MemoryStore;

    fn create_test_app(remote: Arc<MemoryStore>) -> Router {
        let cache = MultiCache::new(100, Duration::from_secs(300), remote).unwrap();
        create_router(AppState::new(Arc::new(cache), Duration::from_millis(500)))
    }

    async fn status_of(app: Router, method: Method, uri: &str, json: Option<&str>) -> StatusCode {
        let builder = Request::builder().method(method).uri(uri);
        let request = match json {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        app.oneshot(request.unwrap()).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_every_route_is_mounted() {
        let remote = Arc::new(MemoryStore::new());
        let app = create_test_app(remote);

        let set = r#"{"key":"test","value":"hello"}"#;
        assert_eq!(status_of(app.clone(), Method::PUT, "/set", Some(set)).await, StatusCode::OK);
        assert_eq!(status_of(app.clone(), Method::GET, "/get/test", None).await, StatusCode::OK);
        assert_eq!(status_of(app.clone(), Method::DELETE, "/del/test", None).await, StatusCode::OK);
        assert_eq!(status_of(app.clone(), Method::GET, "/stats", None).await, StatusCode::OK);
        assert_eq!(status_of(app, Method::GET, "/health", None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_reports_remote_outage() {
        let remote = Arc::new(MemoryStore::new());
        remote.fail_pings(true);

        let status = status_of(create_test_app(remote), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_get_miss_in_both_tiers() {
        let app = create_test_app(Arc::new(MemoryStore::new()));

        let status = status_of(app, Method::GET, "/get/nonexistent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let app = create_test_app(Arc::new(MemoryStore::new()));

        let status = status_of(app, Method::POST, "/set", Some("{}")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
