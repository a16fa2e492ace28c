//! Multi Cache - HTTP front-end for the two-tier cache
//!
//! Serves string values from a bounded local tier backed by a shared remote
//! store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use multi_cache::api::create_router;
use multi_cache::{spawn_cleanup_task, AppState, Config, RemoteStore};

/// Main entry point for the cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Connect to the remote store and ping it
/// 4. Create the two-tier cache and start the background sweep
/// 5. Serve HTTP until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "multi_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Multi Cache Server");

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: capacity={}, default_ttl={}s, local_ttl={:?}, port={}, cleanup_interval={}s",
        config.cache.capacity,
        config.cache.default_ttl.as_secs(),
        config.cache.local_ttl,
        config.server_port,
        config.cleanup_interval
    );

    #[cfg(feature = "redis")]
    let remote = {
        let store = multi_cache::RedisStore::connect(&config.remote)
            .await
            .with_context(|| format!("connecting to {}", config.remote.address))?;
        info!("Connected to remote store at {}", config.remote.address);
        Arc::new(store)
    };

    #[cfg(not(feature = "redis"))]
    let remote = {
        warn!("Built without the `redis` feature, using an in-process remote store");
        Arc::new(multi_cache::MemoryStore::new())
    };

    serve(config, remote).await
}

async fn serve<R>(config: Config, remote: Arc<R>) -> anyhow::Result<()>
where
    R: RemoteStore + 'static,
{
    remote
        .ping()
        .await
        .context("remote store did not answer ping")?;

    let state = AppState::from_config(&config, remote)?;
    info!("Cache tiers initialized");

    let cleanup_handle = spawn_cleanup_task(state.multi().clone(), config.cleanup_interval);
    info!("Background cleanup task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
