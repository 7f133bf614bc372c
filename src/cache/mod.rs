//! Cache Module
//!
//! Read-through caching with TTL expiry and single-flight fetches over a
//! persistent key-value store.

mod entry;
mod file_store;
mod inflight;
mod key;
mod manager;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use file_store::FileStore;
pub use inflight::{Claim, InFlightRegistry, ReleaseGuard, SharedFetch};
pub use key::{CacheKey, Scope, TtlClass, TtlPolicy};
pub use manager::{CacheManager, FetchOptions};
pub use stats::CacheStats;
pub use store::{KvStore, MemoryStore, StoreResult};
