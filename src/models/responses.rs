//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies. Cached payloads are
//! returned as-is; these types cover the cache administration endpoints.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for invalidation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// Number of entries removed, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
}

impl InvalidateResponse {
    /// Response for a single-key invalidation
    pub fn key(composite: impl AsRef<str>) -> Self {
        Self {
            message: format!("Key '{}' invalidated", composite.as_ref()),
            removed: None,
        }
    }

    /// Response for a scope sweep
    pub fn scope(scope: impl AsRef<str>, removed: usize) -> Self {
        Self {
            message: format!("Cache cleared for '{}'", scope.as_ref()),
            removed: Some(removed),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Counters recorded by the cache manager
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Fetches currently in flight
    pub in_flight: usize,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(stats: CacheStats, in_flight: usize) -> Self {
        let hit_rate = stats.hit_rate();
        Self {
            stats,
            hit_rate,
            in_flight,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
