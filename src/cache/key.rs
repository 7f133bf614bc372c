//! Cache Key Module
//!
//! Typed namespace of cache keys and the per-entity scope appended to them.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// == TTL Policy ==
/// TTL applied to each class of cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    /// Volatile data such as search results
    pub short: Duration,
    /// Room and membership data
    pub default: Duration,
    /// Near-static metadata
    pub long: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(5 * 60),
            default: Duration::from_secs(15 * 60),
            long: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Freshness class of a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    Short,
    Default,
    Long,
}

impl TtlPolicy {
    /// Returns the TTL for a class.
    pub fn ttl_for(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::Short => self.short,
            TtlClass::Default => self.default,
            TtlClass::Long => self.long,
        }
    }
}

// == Cache Key ==
/// Logical cache key, one variant per data class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Rooms a user belongs to
    Rooms,
    /// Movies a user has watched
    WatchedMovies,
    /// A user's subscription plan
    UserPlan,
    /// Metadata for a single movie
    MovieDetails,
    /// Results of a movie title search
    MovieSearch,
}

impl CacheKey {
    /// All keys, in declaration order.
    pub const ALL: [CacheKey; 5] = [
        CacheKey::Rooms,
        CacheKey::WatchedMovies,
        CacheKey::UserPlan,
        CacheKey::MovieDetails,
        CacheKey::MovieSearch,
    ];

    /// Logical key string used as the prefix of the composite key.
    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::Rooms => "rooms",
            CacheKey::WatchedMovies => "watched_movies",
            CacheKey::UserPlan => "user_plan",
            CacheKey::MovieDetails => "movie_details",
            CacheKey::MovieSearch => "movie_search",
        }
    }

    /// Freshness class for this kind of data.
    pub fn ttl_class(self) -> TtlClass {
        match self {
            CacheKey::MovieSearch => TtlClass::Short,
            CacheKey::MovieDetails => TtlClass::Long,
            CacheKey::Rooms | CacheKey::WatchedMovies | CacheKey::UserPlan => TtlClass::Default,
        }
    }

    /// Builds the composite store key: `{key}_{scope}`, or `{key}` without scope.
    pub fn composite(self, scope: Option<&Scope>) -> String {
        match scope {
            Some(scope) => format!("{}_{}", self.as_str(), scope.as_str()),
            None => self.as_str().to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("Unknown cache key: {}", s))
    }
}

// == Scope ==
/// Discriminator, usually a user id, isolating entries of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope(String);

impl Scope {
    pub fn new(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }

    /// Scope for a non-user entity, e.g. `movie:603`.
    ///
    /// The `:` keeps these out of the user id namespace, so a user purge never
    /// sweeps shared metadata.
    pub fn namespaced(namespace: &str, id: &str) -> Self {
        Self(format!("{}:{}", namespace, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `composite_key` is exactly `{logical}_{scope}` for some key.
    ///
    /// Keys outside the namespace never match.
    pub fn matches(&self, composite_key: &str) -> bool {
        CacheKey::ALL.into_iter().any(|key| {
            composite_key
                .strip_prefix(key.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                == Some(self.0.as_str())
        })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scope {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Scope {
    fn from(value: String) -> Self {
        Self(value)
    }
}
