//! Origin Module
//!
//! The upstream data source the cache reads through to: the backend holding
//! rooms, watch history and plans, and the movie metadata endpoints.
//! Payloads are passed along as opaque JSON.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::OriginError;

/// Convenience Result type for origin calls.
pub type OriginResult<T> = std::result::Result<T, OriginError>;

// == Origin ==
/// Fetch functions for every cached data class.
#[async_trait]
pub trait Origin: Send + Sync {
    /// Rooms the user belongs to.
    async fn rooms(&self, user_id: &str) -> OriginResult<Value>;

    /// Movies the user has watched.
    async fn watched_movies(&self, user_id: &str) -> OriginResult<Value>;

    /// The user's subscription plan.
    async fn user_plan(&self, user_id: &str) -> OriginResult<Value>;

    /// Metadata for one movie.
    async fn movie_details(&self, movie_id: &str) -> OriginResult<Value>;

    /// Movies matching a title query.
    async fn search_movies(&self, query: &str) -> OriginResult<Value>;
}

// == Http Origin ==
/// Origin reached over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpOrigin {
    /// Creates an origin rooted at `base_url`, optionally sending a bearer token.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    /// Same as [`HttpOrigin::new`] with a preconfigured client.
    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Builds the full URL for an origin path.
    ///
    /// Each segment is percent-encoded on its own, so caller-supplied ids can
    /// never leave their path position. Empty and dot segments are refused.
    pub fn url(&self, segments: &[&str]) -> OriginResult<Url> {
        if let Some(segment) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(OriginError::Request(format!(
                "invalid path segment: {:?}",
                segment
            )));
        }

        let mut url = Url::parse(&self.base_url).map_err(|err| {
            OriginError::Request(format!("invalid origin url {}: {}", self.base_url, err))
        })?;
        url.path_segments_mut()
            .map_err(|_| OriginError::Request(format!("origin url has no path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, segments: &[&str], query: &[(&str, &str)]) -> OriginResult<Value> {
        let url = self.url(segments)?;
        debug!("GET {} {:?}", url, query);

        let mut request = self.client.get(url).query(query);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OriginError::Status(status.as_u16()));
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn rooms(&self, user_id: &str) -> OriginResult<Value> {
        self.get_json(&["rooms"], &[("user_id", user_id)]).await
    }

    async fn watched_movies(&self, user_id: &str) -> OriginResult<Value> {
        self.get_json(&["watched_movies"], &[("user_id", user_id)]).await
    }

    async fn user_plan(&self, user_id: &str) -> OriginResult<Value> {
        self.get_json(&["user_plan"], &[("user_id", user_id)]).await
    }

    async fn movie_details(&self, movie_id: &str) -> OriginResult<Value> {
        self.get_json(&["movies", movie_id], &[]).await
    }

    async fn search_movies(&self, query: &str) -> OriginResult<Value> {
        self.get_json(&["movies", "search"], &[("query", query)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::{
        http::{header, HeaderMap, StatusCode, Uri},
        response::{IntoResponse, Response},
        Json, Router,
    };
    use serde_json::json;

    /// Backend stand-in. Paths under `/missing`, `/broken` and `/garbage` fail;
    /// anything else echoes the request it received.
    async fn backend(uri: Uri, headers: HeaderMap) -> Response {
        let path = uri.path();
        if path.starts_with("/missing/") {
            return StatusCode::NOT_FOUND.into_response();
        }
        if path.starts_with("/broken/") {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        if path.starts_with("/garbage/") {
            return "not json".into_response();
        }

        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        Json(json!({
            "path": path,
            "query": uri.query(),
            "authorization": authorization,
        }))
        .into_response()
    }

    async fn spawn_backend() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().fallback(backend))
                .await
                .unwrap();
        });
        addr
    }

    fn origin_at(base_url: String, api_key: Option<&str>) -> HttpOrigin {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpOrigin::with_client(client, base_url, api_key.map(str::to_string))
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let origin = HttpOrigin::new("http://backend.local/", None);
        assert_eq!(origin.url(&["rooms"]).unwrap().as_str(), "http://backend.local/rooms");
        assert_eq!(
            origin.url(&["movies", "42"]).unwrap().as_str(),
            "http://backend.local/movies/42"
        );
    }

    #[test]
    fn test_url_keeps_movie_id_inside_movies_path() {
        let origin = HttpOrigin::new("http://backend.local/api", None);

        let url = origin.url(&["movies", "../admin/users"]).unwrap();

        assert_eq!(url.path(), "/api/movies/..%2Fadmin%2Fusers");
    }

    #[test]
    fn test_url_rejects_dot_segments() {
        let origin = HttpOrigin::new("http://backend.local/api", None);

        assert!(matches!(origin.url(&["movies", ".."]), Err(OriginError::Request(_))));
        assert!(matches!(origin.url(&["movies", ""]), Err(OriginError::Request(_))));
    }

    #[tokio::test]
    async fn test_requests_carry_path_query_and_bearer_token() {
        let addr = spawn_backend().await;
        let origin = origin_at(format!("http://{}/api", addr), Some("secret"));

        let rooms = origin.rooms("user123").await.unwrap();
        assert_eq!(rooms["path"], "/api/rooms");
        assert_eq!(rooms["query"], "user_id=user123");
        assert_eq!(rooms["authorization"], "Bearer secret");

        let plan = origin.user_plan("user123").await.unwrap();
        assert_eq!(plan["path"], "/api/user_plan");

        let search = origin.search_movies("the matrix").await.unwrap();
        assert_eq!(search["path"], "/api/movies/search");
        assert_eq!(search["query"], "query=the+matrix");

        let movie = origin.movie_details("603").await.unwrap();
        assert_eq!(movie["path"], "/api/movies/603");
        assert_eq!(movie["query"], Value::Null);
    }

    #[tokio::test]
    async fn test_requests_without_api_key_send_no_authorization() {
        let addr = spawn_backend().await;
        let origin = origin_at(format!("http://{}", addr), None);

        let watched = origin.watched_movies("u1").await.unwrap();

        assert_eq!(watched["path"], "/watched_movies");
        assert_eq!(watched["authorization"], Value::Null);
    }

    #[tokio::test]
    async fn test_encoded_movie_id_reaches_movies_path() {
        let addr = spawn_backend().await;
        let origin = origin_at(format!("http://{}/api", addr), Some("secret"));

        let movie = origin.movie_details("../admin/users").await.unwrap();

        assert_eq!(movie["path"], "/api/movies/..%2Fadmin%2Fusers");
    }

    #[tokio::test]
    async fn test_error_statuses_map_to_status_error() {
        let addr = spawn_backend().await;

        let missing = origin_at(format!("http://{}/missing", addr), None);
        assert_eq!(missing.movie_details("603").await, Err(OriginError::Status(404)));

        let broken = origin_at(format!("http://{}/broken", addr), None);
        assert_eq!(broken.rooms("user123").await, Err(OriginError::Status(500)));
    }

    #[tokio::test]
    async fn test_invalid_body_is_decode_error() {
        let addr = spawn_backend().await;
        let origin = origin_at(format!("http://{}/garbage", addr), None);

        let result = origin.rooms("user123").await;

        assert!(matches!(result, Err(OriginError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_origin_is_request_error() {
        // Port 9 (discard) is closed on test machines; the connection is refused.
        let origin = origin_at("http://127.0.0.1:9".to_string(), None);

        let result = origin.rooms("user123").await;

        assert!(matches!(result, Err(OriginError::Request(_))));
    }
}
