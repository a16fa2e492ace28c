//! Redis-backed remote store.

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisError,
};
use tracing::info;

use super::RemoteStore;
use crate::config::RemoteConfig;
use crate::error::{CacheError, Result};

/// Remote tier over a multiplexed, auto-reconnecting redis connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Opens a connection manager for a single node described by `config`.
    ///
    /// Credentials are passed as fields, never spliced into a URL.
    pub async fn connect(config: &RemoteConfig) -> Result<Self> {
        let (host, port) = config.host_port()?;
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(host, port),
            redis: RedisConnectionInfo {
                db: config.db,
                password: config.password.clone(),
                ..Default::default()
            },
        };
        let client = Client::open(info).map_err(store_error)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(store_error)?;
        info!(address = %config.address, db = config.db, "Connected to remote store");
        Ok(Self { conn })
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

fn store_error(err: RedisError) -> CacheError {
    CacheError::Store(err.to_string())
}

impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(store_error)?;
        value.ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        // PSETEX rejects zero
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let _: () = conn.pset_ex(key, value, millis).await.map_err(store_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(store_error)?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
