//! Request DTOs for the gateway API
//!
//! Defines the query strings accepted by the HTTP endpoints.

use serde::Deserialize;

/// Query string for cached reads (`?refresh=true`)
///
/// # Fields
/// - `refresh`: bypass the cache and replace the entry with fresh data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub refresh: bool,
}

/// Query string for movie search (`GET /movies/search?q=...`)
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    /// Title text to search for
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub refresh: bool,
}

impl SearchQuery {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.q.trim().is_empty() {
            return Some("Search query cannot be empty".to_string());
        }
        None
    }

    /// Query normalized for use as a cache scope.
    pub fn normalized(&self) -> String {
        self.q.trim().to_lowercase()
    }
}

/// Validates a movie id taken from the request path.
///
/// The id becomes one path segment of the origin URL, so separators and dot
/// segments are refused.
pub fn validate_movie_id(movie_id: &str) -> Option<String> {
    if movie_id.trim().is_empty() {
        return Some("Movie id cannot be empty".to_string());
    }
    if movie_id == "." || movie_id == ".." || movie_id.contains(|c: char| c == '/' || c == '\\') {
        return Some(format!("Invalid movie id: {}", movie_id));
    }
    None
}

/// Query string for single-key invalidation (`DELETE /cache/:key?scope=...`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    #[serde(default)]
    pub scope: Option<String>,
}
