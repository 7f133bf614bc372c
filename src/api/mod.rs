//! API Module
//!
//! HTTP handlers and routing for the caching gateway.
//!
//! # Endpoints
//! - `GET /users/:user_id/{rooms,watched,plan}` - Cached per-user data
//! - `GET /movies/:movie_id`, `GET /movies/search` - Cached movie metadata
//! - `DELETE /users/:user_id/cache` - Purge a user's cached data
//! - `DELETE /cache/:key` - Invalidate one entry
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
