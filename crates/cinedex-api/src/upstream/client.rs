//! `CatalogClient` - read-through HTTP client for the remote catalog.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use reqwest::header::ACCEPT;
use reqwest::{Client, Request};
use serde::Deserialize;
use serde_json::Value;
use tracing::{Instrument, instrument};
use url::Url;

use super::api::LocalCatalogApi;
use crate::cache::{DEFAULT_CACHE_SECONDS, ResponseCache};
use crate::error::{CatalogError, Result};
use crate::query::BuiltQuery;

/// Default base URL for TMDB API v3.
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default transport timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body the catalog sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    status_code: u32,
    status_message: String,
}

/// Catalog API client.
///
/// Does not retry: a failed call is reported once and retry policy is
/// left to the caller.
#[allow(clippy::module_name_repetitions)]
pub struct CatalogClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Bearer API token.
    api_token: String,
    /// Response cache shared by all requests of this client.
    cache: ResponseCache,
    /// Cache lifetime used when a query carries no override.
    default_cache_seconds: u64,
}

impl fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url.as_str())
            .field("default_cache_seconds", &self.default_cache_seconds)
            .field("cached_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Builder for `CatalogClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct CatalogClientBuilder {
    base_url: Option<Url>,
    api_token: Option<String>,
    user_agent: Option<String>,
    default_cache_seconds: Option<u64>,
    timeout: Option<Duration>,
    cache: Option<ResponseCache>,
}

impl CatalogClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_token: None,
            user_agent: None,
            default_cache_seconds: None,
            timeout: None,
            cache: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API bearer token (required).
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the cache lifetime used when a query has no override (default: 24h).
    #[must_use]
    pub const fn default_cache_seconds(mut self, seconds: u64) -> Self {
        self.default_cache_seconds = Some(seconds);
        self
    }

    /// Sets the transport timeout (default: 10s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Uses `cache` instead of a fresh in-memory cache. The fresh cache
    /// retains entries for the longer of 24h and `default_cache_seconds`.
    #[must_use]
    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_token` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> AnyResult<CatalogClient> {
        let api_token = self.api_token.context("api_token is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            Url::parse(DEFAULT_BASE_URL).context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        let default_cache_seconds = self.default_cache_seconds.unwrap_or(DEFAULT_CACHE_SECONDS);
        let cache = self.cache.unwrap_or_else(|| {
            ResponseCache::default().with_retention(default_cache_seconds.max(DEFAULT_CACHE_SECONDS))
        });

        Ok(CatalogClient {
            http_client,
            base_url,
            api_token,
            cache,
            default_cache_seconds,
        })
    }
}

impl CatalogClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> CatalogClientBuilder {
        CatalogClientBuilder::new()
    }

    /// Base URL every query is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Handle to the response cache.
    #[must_use]
    pub const fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    fn build_request(&self, url: Url) -> Result<Request> {
        self.http_client
            .get(url)
            .bearer_auth(&self.api_token)
            .header(ACCEPT, "application/json")
            .build()
            .map_err(|e| CatalogError::UpstreamUnavailable(format!("failed to build request: {e}")))
    }
}

impl LocalCatalogApi for CatalogClient {
    #[instrument(skip_all, fields(path = %query.path))]
    async fn fetch_json(&self, query: &BuiltQuery) -> Result<Value> {
        let url = query.url(&self.base_url)?;
        let key = url.to_string();
        let max_age = query.cache_seconds.unwrap_or(self.default_cache_seconds);

        if let Some(body) = self.cache.lookup(&key, max_age) {
            match parse_envelope(&body) {
                Ok(value) => {
                    tracing::debug!(url = %key, "catalog cache hit");
                    return Ok(value);
                }
                Err(e) => tracing::warn!(url = %key, error = %e, "discarding unreadable cache entry"),
            }
        }

        let request = self.build_request(url)?;
        tracing::debug!(url = %request.url(), "catalog request");

        // Runs on its own task so an abandoned caller still warms the cache.
        let task = tokio::spawn(
            execute(self.http_client.clone(), request, self.cache.clone(), key).in_current_span(),
        );
        match task.await {
            Ok(result) => result,
            Err(e) => Err(CatalogError::UpstreamUnavailable(format!(
                "request task failed: {e}"
            ))),
        }
    }
}

/// Sends `request`, classifies the outcome, and caches successful bodies under `key`.
async fn execute(
    http_client: Client,
    request: Request,
    cache: ResponseCache,
    key: String,
) -> Result<Value> {
    let response = http_client.execute(request).await.map_err(|e| {
        tracing::warn!(error = %e, "catalog transport failure");
        CatalogError::UpstreamUnavailable(e.to_string())
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CatalogError::UpstreamUnavailable(format!("failed to read body: {e}")))?;

    if !status.is_success() {
        if let Ok(error_body) = serde_json::from_str::<UpstreamErrorBody>(&body) {
            tracing::warn!(
                status = status.as_u16(),
                code = error_body.status_code,
                message = %error_body.status_message,
                "catalog rejected request"
            );
        } else {
            tracing::warn!(status = status.as_u16(), "catalog rejected request");
        }
        return Err(CatalogError::UpstreamError {
            status: status.as_u16(),
            body,
        });
    }

    let value = parse_envelope(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "catalog returned a malformed body");
    })?;
    cache.insert(key, body);
    Ok(value)
}

/// Parses a body that must be a JSON object.
fn parse_envelope(body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| CatalogError::MalformedResponse(format!("invalid JSON: {e}")))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(CatalogError::MalformedResponse(String::from(
            "expected a JSON object envelope",
        )))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::cache::{ManualClock, MemoryStore};
    use crate::query::{ListingQuery, MediaKind, QueryBuilder};

    fn client_for(server: &MockServer) -> CatalogClient {
        let base_url = format!("{}/3/", server.uri());
        CatalogClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap()
    }

    fn popular_movies(page: u32) -> BuiltQuery {
        QueryBuilder::default()
            .listing(
                &ListingQuery::new(MediaKind::Movie)
                    .feed(crate::query::Feed::Popular)
                    .page(page),
            )
            .unwrap()
    }

    fn listing_body() -> serde_json::Value {
        json!({
            "page": 1,
            "results": [{"id": 603, "title": "The Matrix", "poster_path": "/m.jpg"}],
            "total_pages": 3,
            "total_results": 41
        })
    }

    #[test]
    fn test_builder_requires_api_token() {
        // Arrange & Act
        let result = CatalogClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("api_token is required")
        );
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = CatalogClient::builder().api_token("test-token").build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_defaults() {
        // Arrange & Act
        let client = CatalogClient::builder()
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
        assert_eq!(client.default_cache_seconds, DEFAULT_CACHE_SECONDS);
        assert!(client.cache().is_empty());
    }

    #[test]
    fn test_builder_retention_covers_long_lifetime() {
        // Arrange & Act
        let week = 7 * 86_400;
        let long = CatalogClient::builder()
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .default_cache_seconds(week)
            .build()
            .unwrap();
        let short = CatalogClient::builder()
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .default_cache_seconds(60)
            .build()
            .unwrap();

        // Assert
        assert_eq!(long.cache().retention_seconds(), week);
        assert_eq!(short.cache().retention_seconds(), DEFAULT_CACHE_SECONDS);
    }

    #[test]
    fn test_debug_hides_token() {
        // Arrange
        let client = CatalogClient::builder()
            .api_token("super-secret")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act
        let debug = format!("{client:?}");

        // Assert
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_fetch_sends_query_and_bearer_token() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/movie/popular"))
            .and(query_param("language", "en-US"))
            .and(query_param("page", "2"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let value = client.fetch_json(&popular_movies(2)).await.unwrap();

        // Assert
        assert_eq!(value["total_pages"], 3);
    }

    #[tokio::test]
    async fn test_repeat_request_served_from_cache() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);
        let query = popular_movies(1);

        // Act
        let first = client.fetch_json(&query).await.unwrap();
        let second = client.fetch_json(&query).await.unwrap();

        // Assert
        assert_eq!(first, second);
        assert_eq!(client.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_key_includes_query_parameters() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
            .expect(2)
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        client.fetch_json(&popular_movies(1)).await.unwrap();
        client.fetch_json(&popular_movies(2)).await.unwrap();

        // Assert
        assert_eq!(client.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
            .expect(2)
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let cache = ResponseCache::new(Arc::new(MemoryStore::new()), clock.clone());
        let client = CatalogClient::builder()
            .base_url(format!("{}/3/", server.uri()).parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .default_cache_seconds(600)
            .cache(cache)
            .build()
            .unwrap();
        let query = popular_movies(1);

        // Act
        client.fetch_json(&query).await.unwrap();
        clock.advance(599);
        client.fetch_json(&query).await.unwrap();
        clock.advance(1);
        client.fetch_json(&query).await.unwrap();

        // Assert: mock expect(2) verifies one hit and one refetch
    }

    #[tokio::test]
    async fn test_zero_cache_seconds_always_refetches() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
            .expect(2)
            .mount(&server)
            .await;
        let client = client_for(&server);
        let mut query = popular_movies(1);
        query.cache_seconds = Some(0);

        // Act & Assert (mock expect(2))
        client.fetch_json(&query).await.unwrap();
        client.fetch_json(&query).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_error_is_upstream_error() {
        // Arrange
        let server = MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string(error_body))
            .expect(2)
            .mount(&server)
            .await;
        let client = client_for(&server);
        let query = popular_movies(1);

        // Act
        let first = client.fetch_json(&query).await.unwrap_err();
        let second = client.fetch_json(&query).await.unwrap_err();

        // Assert: errors are reported as-is and never cached
        match first {
            CatalogError::UpstreamError { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(second, CatalogError::UpstreamError { status: 401, .. }));
        assert!(client.cache().is_empty());
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let err = client.fetch_json(&popular_movies(1)).await.unwrap_err();

        // Assert
        assert!(matches!(err, CatalogError::MalformedResponse(_)));
        assert!(client.cache().is_empty());
    }

    #[tokio::test]
    async fn test_non_object_json_is_malformed() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[1,2,3]"))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let err = client.fetch_json(&popular_movies(1)).await.unwrap_err();

        // Assert
        assert!(matches!(err, CatalogError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_unavailable() {
        // Arrange
        let client = CatalogClient::builder()
            .base_url(Url::parse("http://127.0.0.1:1/3/").unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        // Act
        let err = client.fetch_json(&popular_movies(1)).await.unwrap_err();

        // Assert
        assert!(matches!(err, CatalogError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_upstream_unavailable() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(listing_body())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;
        let client = CatalogClient::builder()
            .base_url(format!("{}/3/", server.uri()).parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        // Act
        let err = client.fetch_json(&popular_movies(1)).await.unwrap_err();

        // Assert
        assert!(matches!(err, CatalogError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_abandoned_request_still_warms_cache() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(listing_body())
                    .set_delay(Duration::from_millis(150)),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);
        let query = popular_movies(1);

        // Act
        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), client.fetch_json(&query)).await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        let warmed = client.fetch_json(&query).await;

        // Assert
        assert!(abandoned.is_err());
        assert!(warmed.is_ok());
        assert_eq!(client.cache().len(), 1);
    }
}
