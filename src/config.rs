//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::TtlPolicy;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Directory for the file-backed store, None = in-memory store
    pub cache_dir: Option<PathBuf>,
    /// Base URL of the backend serving rooms, plans and movie metadata
    pub origin_url: String,
    /// Optional bearer token sent to the backend
    pub origin_api_key: Option<String>,
    /// TTL in milliseconds for volatile data (search results)
    pub short_ttl_ms: u64,
    /// TTL in milliseconds for room and membership data
    pub default_ttl_ms: u64,
    /// TTL in milliseconds for near-static metadata
    pub long_ttl_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_DIR` - Directory for persisted entries (default: unset, in-memory)
    /// - `ORIGIN_URL` - Backend base URL (default: http://localhost:54321)
    /// - `ORIGIN_API_KEY` - Bearer token for the backend (default: unset)
    /// - `SHORT_TTL_MS` - Volatile data TTL (default: 300000)
    /// - `DEFAULT_TTL_MS` - Room data TTL (default: 900000)
    /// - `LONG_TTL_MS` - Metadata TTL (default: 86400000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_dir: non_empty_var("CACHE_DIR").map(PathBuf::from),
            origin_url: non_empty_var("ORIGIN_URL").unwrap_or(defaults.origin_url),
            origin_api_key: non_empty_var("ORIGIN_API_KEY"),
            short_ttl_ms: parse_var("SHORT_TTL_MS").unwrap_or(defaults.short_ttl_ms),
            default_ttl_ms: parse_var("DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            long_ttl_ms: parse_var("LONG_TTL_MS").unwrap_or(defaults.long_ttl_ms),
        }
    }

    /// TTL classes derived from the configured millisecond values.
    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            short: Duration::from_millis(self.short_ttl_ms),
            default: Duration::from_millis(self.default_ttl_ms),
            long: Duration::from_millis(self.long_ttl_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_dir: None,
            origin_url: "http://localhost:54321".to_string(),
            origin_api_key: None,
            short_ttl_ms: 300_000,
            default_ttl_ms: 900_000,
            long_ttl_ms: 86_400_000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert!(config.cache_dir.is_none());
        assert_eq!(config.origin_url, "http://localhost:54321");
        assert_eq!(config.default_ttl_ms, 900_000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("CACHE_DIR");
        env::remove_var("ORIGIN_URL");
        env::remove_var("ORIGIN_API_KEY");
        env::remove_var("SHORT_TTL_MS");
        env::remove_var("DEFAULT_TTL_MS");
        env::remove_var("LONG_TTL_MS");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert!(config.cache_dir.is_none());
        assert!(config.origin_api_key.is_none());
        assert_eq!(config.short_ttl_ms, 300_000);
        assert_eq!(config.long_ttl_ms, 86_400_000);
    }

    #[test]
    fn test_ttl_policy_from_config() {
        let config = Config {
            short_ttl_ms: 1_000,
            default_ttl_ms: 2_000,
            long_ttl_ms: 3_000,
            ..Config::default()
        };
        let policy = config.ttl_policy();
        assert_eq!(policy.short, Duration::from_secs(1));
        assert_eq!(policy.default, Duration::from_secs(2));
        assert_eq!(policy.long, Duration::from_secs(3));
    }
}
