//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::TierStats;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Whether a live local entry was replaced
    pub replaced: bool,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, replaced: bool) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            replaced,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Local tier hits
    pub hits: u64,
    /// Local tier misses
    pub misses: u64,
    /// Capacity evictions
    pub evictions: u64,
    /// TTL purges
    pub expirations: u64,
    /// Current number of local entries
    pub total_entries: usize,
    /// Local hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Local misses answered by the remote
    pub remote_hits: u64,
    /// Local misses the remote did not know either
    pub remote_misses: u64,
    /// Failed remote calls
    pub remote_errors: u64,
}

impl From<TierStats> for StatsResponse {
    fn from(stats: TierStats) -> Self {
        Self {
            hit_rate: stats.local.hit_rate(),
            hits: stats.local.hits,
            misses: stats.local.misses,
            evictions: stats.local.evictions,
            expirations: stats.local.expirations,
            total_entries: stats.local.total_entries,
            remote_hits: stats.remote_hits,
            remote_misses: stats.remote_misses,
            remote_errors: stats.remote_errors,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the remote store answers pings
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
