//! Cache Entry Module
//!
//! Defines the persisted envelope wrapping every cached payload.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached payload together with its creation time and TTL.
///
/// Persisted as `{ "data": ..., "timestamp": <unix ms>, "expiry": <ttl ms> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached payload
    #[serde(rename = "data")]
    pub payload: T,
    /// Creation timestamp (Unix milliseconds)
    #[serde(rename = "timestamp")]
    pub stored_at: u64,
    /// Time to live in milliseconds
    #[serde(rename = "expiry")]
    pub ttl_ms: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(payload: T, ttl: Duration) -> Self {
        Self {
            payload,
            stored_at: current_timestamp_ms(),
            ttl_ms: duration_ms(ttl),
        }
    }

    // == Validity ==
    /// Checks whether the entry is still fresh at `now_ms`.
    ///
    /// Boundary condition: an entry is valid only while `now - stored_at < ttl`,
    /// so it becomes stale the instant the TTL has fully elapsed. A timestamp in
    /// the future counts as zero age.
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.stored_at) < self.ttl_ms
    }

    /// Checks whether the entry is still fresh now.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(current_timestamp_ms())
    }

    /// Returns the payload if the entry is still fresh.
    pub fn into_fresh_payload(self) -> Option<T> {
        if self.is_valid() {
            Some(self.payload)
        } else {
            None
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as 0, which makes every entry look old.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn duration_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(vec!["r1".to_string()], Duration::from_secs(60));

        assert_eq!(entry.payload, vec!["r1".to_string()]);
        assert_eq!(entry.ttl_ms, 60_000);
        assert!(entry.is_valid());
    }

    #[test]
    fn test_zero_ttl_is_never_valid() {
        let entry = CacheEntry::new(1u32, Duration::ZERO);
        assert!(!entry.is_valid_at(entry.stored_at));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry {
            payload: "x",
            stored_at: 1_000,
            ttl_ms: 500,
        };

        assert!(entry.is_valid_at(1_000));
        assert!(entry.is_valid_at(1_499));
        assert!(!entry.is_valid_at(1_500), "Entry should be stale at boundary");
        assert!(!entry.is_valid_at(10_000));
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        let entry = CacheEntry {
            payload: "x",
            stored_at: 5_000,
            ttl_ms: 10,
        };
        assert!(entry.is_valid_at(1_000));
    }

    #[test]
    fn test_envelope_wire_format() {
        let entry = CacheEntry {
            payload: serde_json::json!([{"id": "r1"}]),
            stored_at: 1_700_000_000_000,
            ttl_ms: 900_000,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["data"][0]["id"], "r1");
        assert_eq!(json["timestamp"], 1_700_000_000_000u64);
        assert_eq!(json["expiry"], 900_000);
    }

    #[test]
    fn test_into_fresh_payload_drops_stale() {
        let stale = CacheEntry {
            payload: 7,
            stored_at: 0,
            ttl_ms: 1,
        };
        assert_eq!(stale.into_fresh_payload(), None);

        let fresh = CacheEntry::new(7, Duration::from_secs(60));
        assert_eq!(fresh.into_fresh_payload(), Some(7));
    }
}
