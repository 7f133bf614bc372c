//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, invalidate_key_handler, invalidate_user_handler, movie_handler, plan_handler,
    rooms_handler, search_handler, stats_handler, watched_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /users/:user_id/rooms` - Rooms of a user
/// - `GET /users/:user_id/watched` - Watched movies of a user
/// - `GET /users/:user_id/plan` - Subscription plan of a user
/// - `DELETE /users/:user_id/cache` - Drop everything cached for a user
/// - `GET /movies/search?q=` - Movie title search
/// - `GET /movies/:movie_id` - Movie metadata
/// - `DELETE /cache/:key?scope=` - Drop a single cache entry
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// Data endpoints accept `?refresh=true` to bypass and replace the cached entry.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/users/:user_id/rooms", get(rooms_handler))
        .route("/users/:user_id/watched", get(watched_handler))
        .route("/users/:user_id/plan", get(plan_handler))
        .route("/users/:user_id/cache", delete(invalidate_user_handler))
        .route("/movies/search", get(search_handler))
        .route("/movies/:movie_id", get(movie_handler))
        .route("/cache/:key", delete(invalidate_key_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
