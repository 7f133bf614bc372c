//! Room Cache - read-through caching for movie room data
//!
//! Serves room lists, watch history, user plans and movie metadata from a
//! persistent cache with per-class TTLs, collapsing concurrent fetches of the
//! same entry into a single upstream request.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod origin;

pub use api::AppState;
pub use cache::{CacheKey, CacheManager, FetchOptions, Scope};
pub use config::Config;
