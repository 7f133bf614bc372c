//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint. Data endpoints read through
//! the cache manager to the origin; admin endpoints invalidate and report.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::{CacheKey, CacheManager, FetchOptions, FileStore, KvStore, MemoryStore, Scope};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    validate_movie_id, HealthResponse, InvalidateQuery, InvalidateResponse, RefreshQuery,
    SearchQuery, StatsResponse,
};
use crate::origin::{HttpOrigin, Origin, OriginResult};

/// Application state shared across all handlers.
///
/// Both fields are cheap to clone and shared between clones.
#[derive(Clone)]
pub struct AppState {
    /// Read-through cache
    pub cache: CacheManager,
    /// Upstream data source
    pub origin: Arc<dyn Origin>,
}

impl AppState {
    /// Creates a new AppState with the given cache and origin.
    pub fn new(cache: CacheManager, origin: Arc<dyn Origin>) -> Self {
        Self { cache, origin }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Uses a file-backed store when `cache_dir` is set, memory otherwise.
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn KvStore> = match &config.cache_dir {
            Some(dir) => Arc::new(FileStore::new(dir)),
            None => Arc::new(MemoryStore::new()),
        };
        let cache = CacheManager::new(store, config.ttl_policy());
        let origin = HttpOrigin::new(&config.origin_url, config.origin_api_key.clone());
        Self::new(cache, Arc::new(origin))
    }
}

/// Serves `key` for `scope` from the cache, fetching `arg` through `fetch` on a miss.
async fn read_through<F, Fut>(
    state: &AppState,
    key: CacheKey,
    scope: Scope,
    arg: String,
    refresh: bool,
    fetch: F,
) -> Result<Json<Value>>
where
    F: FnOnce(Arc<dyn Origin>, String) -> Fut + Send + 'static,
    Fut: Future<Output = OriginResult<Value>> + Send + 'static,
{
    let origin = state.origin.clone();
    let options = FetchOptions::default().force_refresh(refresh);

    let value = state
        .cache
        .get_or_fetch(key, Some(&scope), options, move || fetch(origin, arg))
        .await?;

    Ok(Json(value))
}

/// Handler for GET /users/:user_id/rooms
pub async fn rooms_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<Value>> {
    read_through(
        &state,
        CacheKey::Rooms,
        Scope::new(user_id.as_str()),
        user_id,
        query.refresh,
        |origin, user_id| async move { origin.rooms(&user_id).await },
    )
    .await
}

/// Handler for GET /users/:user_id/watched
pub async fn watched_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<Value>> {
    read_through(
        &state,
        CacheKey::WatchedMovies,
        Scope::new(user_id.as_str()),
        user_id,
        query.refresh,
        |origin, user_id| async move { origin.watched_movies(&user_id).await },
    )
    .await
}

/// Handler for GET /users/:user_id/plan
pub async fn plan_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<Value>> {
    read_through(
        &state,
        CacheKey::UserPlan,
        Scope::new(user_id.as_str()),
        user_id,
        query.refresh,
        |origin, user_id| async move { origin.user_plan(&user_id).await },
    )
    .await
}

/// Handler for GET /movies/:movie_id
///
/// Cached under the `movie:` scope namespace, apart from user ids.
pub async fn movie_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<Value>> {
    if let Some(error_msg) = validate_movie_id(&movie_id) {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    read_through(
        &state,
        CacheKey::MovieDetails,
        Scope::namespaced("movie", &movie_id),
        movie_id,
        query.refresh,
        |origin, movie_id| async move { origin.movie_details(&movie_id).await },
    )
    .await
}

/// Handler for GET /movies/search?q=...
///
/// Results are scoped by the normalized query under the `query:` namespace and
/// kept for the short TTL.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>> {
    if let Some(error_msg) = query.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let text = query.normalized();
    read_through(
        &state,
        CacheKey::MovieSearch,
        Scope::namespaced("query", &text),
        text,
        query.refresh,
        |origin, text| async move { origin.search_movies(&text).await },
    )
    .await
}

/// Handler for DELETE /users/:user_id/cache
///
/// Purges every entry cached for the user, e.g. on sign-out.
pub async fn invalidate_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate_scope(&Scope::new(user_id.as_str())).await;
    Json(InvalidateResponse::scope(user_id, removed))
}

/// Handler for DELETE /cache/:key
pub async fn invalidate_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<InvalidateQuery>,
) -> Result<Json<InvalidateResponse>> {
    let key: CacheKey = key.parse().map_err(ApiError::InvalidRequest)?;
    let scope = query.scope.map(Scope::from);

    state.cache.invalidate(key, scope.as_ref()).await;

    Ok(Json(InvalidateResponse::key(key.composite(scope.as_ref()))))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats(), state.cache.in_flight()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
