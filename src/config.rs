//! Configuration Module
//!
//! Handles loading and managing cache and service configuration from
//! environment variables. Nothing here is process-global: callers build a
//! [`Config`] and pass it to the constructors that need it.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default address of a single remote store node.
pub const DEFAULT_REMOTE_ADDRESS: &str = "localhost:6379";

/// Cache tier parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the local tier can hold
    pub capacity: usize,
    /// TTL applied when an operation passes a zero TTL, and on repopulation
    pub default_ttl: Duration,
    /// Optional cap on how long entries live in the local tier
    pub local_ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            default_ttl: Duration::from_secs(300),
            local_ttl: None,
        }
    }
}

/// Connection parameters for the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// `host:port` of the remote node
    pub address: String,
    /// Optional password
    pub password: Option<String>,
    /// Logical database index
    pub db: i64,
    /// Deadline applied to each remote call made on behalf of a request
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Splits `address` into host and port.
    ///
    /// Bracketed IPv6 hosts such as `[::1]:6379` lose their brackets.
    pub fn host_port(&self) -> Result<(String, u16)> {
        let invalid = || CacheError::Config(format!("invalid remote address: {}", self.address));
        let (host, port) = self.address.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid());
        }
        Ok((host.to_string(), port))
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_REMOTE_ADDRESS.to_string(),
            password: None,
            db: 0,
            timeout: Duration::from_millis(1000),
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache tier parameters
    pub cache: CacheConfig,
    /// Remote store connection parameters
    pub remote: RemoteConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum local entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `LOCAL_TTL` - Cap on local entry lifetime in seconds (default: unset)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 1)
    /// - `REDIS_ADDRESS` - Remote node address (default: localhost:6379)
    /// - `REDIS_PASSWORD` - Remote password (default: none)
    /// - `REDIS_DB` - Remote database index (default: 0)
    /// - `REMOTE_TIMEOUT_MS` - Per-request remote deadline (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache: CacheConfig {
                capacity: env_or("CACHE_CAPACITY", defaults.cache.capacity),
                default_ttl: Duration::from_secs(env_or(
                    "DEFAULT_TTL",
                    defaults.cache.default_ttl.as_secs(),
                )),
                local_ttl: env_parse::<u64>("LOCAL_TTL").map(Duration::from_secs),
            },
            remote: RemoteConfig {
                address: env::var("REDIS_ADDRESS")
                    .ok()
                    .filter(|v| !v.is_empty())
                    .unwrap_or(defaults.remote.address),
                password: env::var("REDIS_PASSWORD").ok().filter(|v| !v.is_empty()),
                db: env_or("REDIS_DB", defaults.remote.db),
                timeout: Duration::from_millis(env_or(
                    "REMOTE_TIMEOUT_MS",
                    defaults.remote.timeout.as_millis() as u64,
                )),
            },
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Rejects parameters the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            return Err(CacheError::Config("capacity must be positive".to_string()));
        }
        if self.cache.default_ttl.is_zero() {
            return Err(CacheError::Config("default TTL must be positive".to_string()));
        }
        if self.cleanup_interval == 0 {
            return Err(CacheError::Config("cleanup interval must be positive".to_string()));
        }
        self.remote.host_port()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            remote: RemoteConfig::default(),
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env_parse(name).unwrap_or(default)
}
