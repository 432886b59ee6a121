//! `Catalog` - the operations the presentation layer calls.
//!
//! Each operation builds a query, fetches it through a [`LocalCatalogApi`]
//! implementation and normalizes the response. Multi-request pages
//! (detail page, home feed) issue their reads concurrently and join them.

use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::normalize::{
    CreditsRecord, DetailRecord, NormalizedListing, SeasonDetail, VideoRecord, WatchProviders,
    normalize_credits, normalize_detail, normalize_listing, normalize_season, normalize_videos,
    normalize_watch_providers, select_trailer,
};
use crate::query::{
    DetailRequest, DetailResource, Feed, ListingQuery, ListingScope, MediaKind, QueryBuilder,
    TimeWindow,
};
use crate::upstream::LocalCatalogApi;

/// Everything a detail page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPage {
    /// The item itself.
    pub detail: DetailRecord,
    /// Cast and crew; empty when unavailable.
    pub credits: CreditsRecord,
    /// Trailer to offer, if any.
    pub trailer: Option<VideoRecord>,
}

/// Sections of the landing page. A section that fails to load is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeFeed {
    /// Movies trending today.
    pub trending_movies: NormalizedListing,
    /// Popular movies.
    pub popular_movies: NormalizedListing,
    /// Popular series.
    pub popular_tv: NormalizedListing,
    /// Top-rated movies.
    pub top_rated_movies: NormalizedListing,
    /// Top-rated series.
    pub top_rated_tv: NormalizedListing,
    /// Upcoming movies.
    pub upcoming_movies: NormalizedListing,
    /// Series currently on the air.
    pub on_the_air_tv: NormalizedListing,
}

/// Catalog facade over an upstream API.
#[derive(Debug, Clone)]
pub struct Catalog<A> {
    api: A,
    queries: QueryBuilder,
}

impl<A> Catalog<A> {
    /// Creates a catalog using the default response language.
    pub fn new(api: A) -> Self {
        Self {
            api,
            queries: QueryBuilder::default(),
        }
    }

    /// Creates a catalog whose requests default to `language`.
    pub fn with_language(api: A, language: impl Into<String>) -> Self {
        Self {
            api,
            queries: QueryBuilder::new(language),
        }
    }

    /// Upstream API handle.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Query builder in use.
    pub const fn queries(&self) -> &QueryBuilder {
        &self.queries
    }
}

impl<A: LocalCatalogApi> Catalog<A> {
    /// Fetches one page of a feed, discover listing or text search.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a malformed query and the upstream or
    /// normalization error otherwise.
    #[instrument(skip_all, fields(page = query.page))]
    pub async fn list_catalog(&self, query: &ListingQuery) -> Result<NormalizedListing> {
        let built = self.queries.listing(query)?;
        let value = self.api.fetch_json(&built).await?;
        normalize_listing(
            value,
            query.scope.into(),
            query.effective_text(),
            query.page,
        )
    }

    /// Fetches the detail record of a movie or series.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a zero id and the upstream or
    /// normalization error otherwise.
    #[instrument(skip(self))]
    pub async fn get_detail(
        &self,
        kind: MediaKind,
        id: u64,
        language: Option<&str>,
    ) -> Result<DetailRecord> {
        let request = DetailRequest::new(kind, id, DetailResource::Details).language(language);
        let value = self.fetch_detail(&request).await?;
        normalize_detail(value, kind)
    }

    /// Fetches cast and crew.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a zero id and the upstream or
    /// normalization error otherwise.
    #[instrument(skip(self))]
    pub async fn get_credits(&self, kind: MediaKind, id: u64) -> Result<CreditsRecord> {
        let request = DetailRequest::new(kind, id, DetailResource::Credits);
        let value = self.fetch_detail(&request).await?;
        normalize_credits(value)
    }

    /// Fetches every video attached to a title.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a zero id and the upstream or
    /// normalization error otherwise.
    pub async fn get_videos(&self, kind: MediaKind, id: u64) -> Result<Vec<VideoRecord>> {
        let request = DetailRequest::new(kind, id, DetailResource::Videos);
        let value = self.fetch_detail(&request).await?;
        normalize_videos(value)
    }

    /// Picks the trailer to offer for a title. Failures mean no trailer.
    #[instrument(skip(self))]
    pub async fn get_trailer(&self, kind: MediaKind, id: u64) -> Option<VideoRecord> {
        match self.get_videos(kind, id).await {
            Ok(videos) => select_trailer(&videos).cloned(),
            Err(e) => {
                tracing::warn!(error = %e, "trailer lookup failed");
                None
            }
        }
    }

    /// Fetches a season with its episodes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a zero id and the upstream or
    /// normalization error otherwise.
    #[instrument(skip(self))]
    pub async fn get_season(&self, series_id: u64, season_number: u32) -> Result<SeasonDetail> {
        let request = DetailRequest::new(
            MediaKind::Tv,
            series_id,
            DetailResource::Season(season_number),
        );
        let value = self.fetch_detail(&request).await?;
        normalize_season(value, season_number)
    }

    /// Picks the trailer to offer for a season. Failures mean no trailer.
    #[instrument(skip(self))]
    pub async fn get_season_trailer(
        &self,
        series_id: u64,
        season_number: u32,
    ) -> Option<VideoRecord> {
        let request = DetailRequest::new(
            MediaKind::Tv,
            series_id,
            DetailResource::SeasonVideos(season_number),
        );
        let videos = match self.fetch_detail(&request).await.and_then(normalize_videos) {
            Ok(videos) => videos,
            Err(e) => {
                tracing::warn!(error = %e, "season trailer lookup failed");
                return None;
            }
        };
        select_trailer(&videos).cloned()
    }

    /// Fetches titles recommended alongside `id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a zero id and the upstream or
    /// normalization error otherwise.
    #[instrument(skip(self))]
    pub async fn get_recommendations(&self, kind: MediaKind, id: u64) -> Result<NormalizedListing> {
        let request = DetailRequest::new(kind, id, DetailResource::Recommendations);
        let value = self.fetch_detail(&request).await?;
        normalize_listing(value, kind.into(), None, 1)
    }

    /// Fetches streaming/rental/purchase offers per region.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a zero id and the upstream or
    /// normalization error otherwise.
    #[instrument(skip(self))]
    pub async fn get_watch_providers(&self, kind: MediaKind, id: u64) -> Result<WatchProviders> {
        let request = DetailRequest::new(kind, id, DetailResource::WatchProviders);
        let value = self.fetch_detail(&request).await?;
        normalize_watch_providers(value)
    }

    /// Fetches detail, credits and trailer concurrently.
    ///
    /// Credits and trailer degrade to empty/`None`.
    ///
    /// # Errors
    ///
    /// Returns the detail request's error.
    #[instrument(skip(self))]
    pub async fn get_detail_page(
        &self,
        kind: MediaKind,
        id: u64,
        language: Option<&str>,
    ) -> Result<DetailPage> {
        let (detail, credits, trailer) = futures::join!(
            self.get_detail(kind, id, language),
            self.get_credits(kind, id),
            self.get_trailer(kind, id),
        );
        let credits = credits.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "credits unavailable");
            CreditsRecord::default()
        });
        Ok(DetailPage {
            detail: detail?,
            credits,
            trailer,
        })
    }

    /// Fetches every landing-page section concurrently.
    #[instrument(skip(self))]
    pub async fn get_home_feed(&self) -> HomeFeed {
        let movie = ListingScope::Kind(MediaKind::Movie);
        let tv = ListingScope::Kind(MediaKind::Tv);
        let (
            trending_movies,
            popular_movies,
            popular_tv,
            top_rated_movies,
            top_rated_tv,
            upcoming_movies,
            on_the_air_tv,
        ) = futures::join!(
            self.section(movie, Feed::Trending(TimeWindow::Day)),
            self.section(movie, Feed::Popular),
            self.section(tv, Feed::Popular),
            self.section(movie, Feed::TopRated),
            self.section(tv, Feed::TopRated),
            self.section(movie, Feed::Upcoming),
            self.section(tv, Feed::Upcoming),
        );
        HomeFeed {
            trending_movies,
            popular_movies,
            popular_tv,
            top_rated_movies,
            top_rated_tv,
            upcoming_movies,
            on_the_air_tv,
        }
    }

    async fn section(&self, scope: ListingScope, feed: Feed) -> NormalizedListing {
        let query = ListingQuery::new(scope).feed(feed);
        self.list_catalog(&query).await.unwrap_or_else(|e| {
            tracing::warn!(?feed, error = %e, "home feed section unavailable");
            NormalizedListing {
                items: Vec::new(),
                page: 1,
                total_pages: 1,
                query: None,
            }
        })
    }

    async fn fetch_detail(&self, request: &DetailRequest) -> Result<serde_json::Value> {
        let built = self.queries.detail(request)?;
        self.api.fetch_json(&built).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde_json::{Value, json};

    use super::*;
    use crate::error::CatalogError;
    use crate::query::{BuiltQuery, DiscoverFilters};

    /// Canned responses keyed by endpoint path; unknown paths answer 404.
    #[derive(Debug, Default)]
    struct StubApi {
        responses: HashMap<String, Value>,
        seen: Mutex<Vec<BuiltQuery>>,
    }

    impl StubApi {
        fn with(mut self, path: &str, body: Value) -> Self {
            self.responses.insert(String::from(path), body);
            self
        }

        fn seen_paths(&self) -> Vec<String> {
            let mut paths: Vec<String> = self
                .seen
                .lock()
                .unwrap()
                .iter()
                .map(|q| q.path.clone())
                .collect();
            paths.sort();
            paths
        }
    }

    impl LocalCatalogApi for StubApi {
        async fn fetch_json(&self, query: &BuiltQuery) -> Result<Value> {
            self.seen.lock().unwrap().push(query.clone());
            self.responses
                .get(&query.path)
                .cloned()
                .ok_or_else(|| CatalogError::UpstreamError {
                    status: 404,
                    body: String::from(r#"{"status_code":34}"#),
                })
        }
    }

    fn page_of(ids: &[u64]) -> Value {
        let results: Vec<Value> = ids
            .iter()
            .map(|id| json!({"id": id, "title": format!("Movie {id}"), "poster_path": "/p.jpg"}))
            .collect();
        json!({"page": 1, "results": results, "total_pages": 250})
    }

    #[tokio::test]
    async fn test_list_catalog_normalizes_listing() {
        // Arrange
        let api = StubApi::default().with("movie/popular", page_of(&[1, 2]));
        let catalog = Catalog::new(api);
        let query = ListingQuery::new(MediaKind::Movie).feed(Feed::Popular);

        // Act
        let listing = catalog.list_catalog(&query).await.unwrap();

        // Assert
        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.total_pages, 100);
        let seen = catalog.api().seen.lock().unwrap();
        assert_eq!(seen[0].param("language"), Some("en-US"));
    }

    #[tokio::test]
    async fn test_list_catalog_rejects_search_with_filters() {
        // Arrange
        let catalog = Catalog::new(StubApi::default());
        let query = ListingQuery::search(MediaKind::Movie, "dune")
            .filters(DiscoverFilters::new().with_genres(&[878]));

        // Act
        let err = catalog.list_catalog(&query).await.unwrap_err();

        // Assert
        assert!(err.is_user_error());
        assert!(catalog.api().seen_paths().is_empty());
    }

    #[tokio::test]
    async fn test_multi_search_echoes_query() {
        // Arrange
        let body = json!({"page": 1, "total_pages": 1, "results": [
            {"id": 1, "media_type": "tv", "name": "Dune: Prophecy", "poster_path": "/d.jpg"},
            {"id": 2, "media_type": "person", "name": "Someone", "profile_path": "/s.jpg"}
        ]});
        let catalog = Catalog::new(StubApi::default().with("search/multi", body));
        let query = ListingQuery::search(ListingScope::Multi, " dune ");

        // Act
        let listing = catalog.list_catalog(&query).await.unwrap();

        // Assert
        assert_eq!(listing.query.as_deref(), Some("dune"));
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].media_kind, MediaKind::Tv);
    }

    #[tokio::test]
    async fn test_catalog_language_is_default_for_requests() {
        // Arrange
        let api = StubApi::default().with("movie/603", json!({"id": 603, "title": "Matrix"}));
        let catalog = Catalog::with_language(api, "ja-JP");

        // Act
        catalog.get_detail(MediaKind::Movie, 603, None).await.unwrap();
        catalog
            .get_detail(MediaKind::Movie, 603, Some("fr-FR"))
            .await
            .unwrap();

        // Assert
        let seen = catalog.api().seen.lock().unwrap();
        assert_eq!(seen[0].param("language"), Some("ja-JP"));
        assert_eq!(seen[1].param("language"), Some("fr-FR"));
    }

    #[tokio::test]
    async fn test_get_detail_zero_id_is_invalid() {
        // Arrange
        let catalog = Catalog::new(StubApi::default());

        // Act
        let err = catalog.get_detail(MediaKind::Tv, 0, None).await.unwrap_err();

        // Assert
        assert!(err.is_user_error());
    }

    #[tokio::test]
    async fn test_get_trailer_prefers_trailer_type() {
        // Arrange
        let videos = json!({"id": 603, "results": [
            {"key": "a", "site": "YouTube", "type": "Teaser"},
            {"key": "b", "site": "YouTube", "type": "Trailer"}
        ]});
        let catalog = Catalog::new(StubApi::default().with("movie/603/videos", videos));

        // Act
        let trailer = catalog.get_trailer(MediaKind::Movie, 603).await;

        // Assert
        assert_eq!(trailer.map(|v| v.key), Some(String::from("b")));
    }

    #[tokio::test]
    async fn test_get_trailer_failure_is_none() {
        // Arrange
        let catalog = Catalog::new(StubApi::default());

        // Act
        let trailer = catalog.get_trailer(MediaKind::Movie, 603).await;

        // Assert
        assert!(trailer.is_none());
    }

    #[tokio::test]
    async fn test_get_season_and_season_trailer() {
        // Arrange
        let api = StubApi::default()
            .with(
                "tv/1399/season/1",
                json!({"season_number": 1, "name": "Season 1", "episodes": [
                    {"id": 63056, "episode_number": 1, "name": "Winter Is Coming"}
                ]}),
            )
            .with(
                "tv/1399/season/1/videos",
                json!({"results": [{"key": "s1", "type": "Teaser"}]}),
            );
        let catalog = Catalog::new(api);

        // Act
        let season = catalog.get_season(1399, 1).await.unwrap();
        let trailer = catalog.get_season_trailer(1399, 1).await;

        // Assert
        assert_eq!(season.episodes.len(), 1);
        assert_eq!(trailer.map(|v| v.key), Some(String::from("s1")));
    }

    #[tokio::test]
    async fn test_recommendations_and_watch_providers() {
        // Arrange
        let api = StubApi::default()
            .with("movie/603/recommendations", page_of(&[604, 605]))
            .with(
                "movie/603/watch/providers",
                json!({"id": 603, "results": {"US": {"link": "https://example.test/603"}}}),
            );
        let catalog = Catalog::new(api);

        // Act
        let recommendations = catalog
            .get_recommendations(MediaKind::Movie, 603)
            .await
            .unwrap();
        let providers = catalog
            .get_watch_providers(MediaKind::Movie, 603)
            .await
            .unwrap();

        // Assert
        assert_eq!(recommendations.items.len(), 2);
        assert!(providers.contains_key("US"));
    }

    #[tokio::test]
    async fn test_detail_page_degrades_credits_and_trailer() {
        // Arrange
        let api = StubApi::default().with("tv/1399", json!({"id": 1399, "name": "Game of Thrones"}));
        let catalog = Catalog::new(api);

        // Act
        let page = catalog
            .get_detail_page(MediaKind::Tv, 1399, None)
            .await
            .unwrap();

        // Assert
        assert_eq!(page.detail.title, "Game of Thrones");
        assert!(page.credits.cast.is_empty());
        assert!(page.trailer.is_none());
        assert_eq!(
            catalog.api().seen_paths(),
            vec!["tv/1399", "tv/1399/credits", "tv/1399/videos"]
        );
    }

    #[tokio::test]
    async fn test_detail_page_fails_with_detail() {
        // Arrange
        let api = StubApi::default().with("movie/1/credits", json!({"cast": [], "crew": []}));
        let catalog = Catalog::new(api);

        // Act
        let err = catalog
            .get_detail_page(MediaKind::Movie, 1, None)
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(err, CatalogError::UpstreamError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_home_feed_fetches_every_section() {
        // Arrange
        let api = StubApi::default()
            .with("trending/movie/day", page_of(&[1]))
            .with("movie/popular", page_of(&[2]))
            .with("tv/popular", page_of(&[3]))
            .with("movie/top_rated", page_of(&[4]))
            .with("movie/upcoming", page_of(&[6]))
            .with("tv/on_the_air", page_of(&[7]));
        let catalog = Catalog::new(api);

        // Act
        let feed = catalog.get_home_feed().await;

        // Assert
        assert_eq!(feed.trending_movies.items[0].id, 1);
        assert_eq!(feed.on_the_air_tv.items[0].id, 7);
        assert!(feed.top_rated_tv.items.is_empty());
        assert_eq!(catalog.api().seen_paths().len(), 7);
    }
}
