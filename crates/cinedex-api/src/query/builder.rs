//! `QueryBuilder` - turns logical requests into upstream paths and parameters.

use url::Url;

use super::params::{
    DetailRequest, DetailResource, Feed, ListingQuery, ListingScope, MediaKind,
};
use crate::error::{CatalogError, Result};

/// Default response language.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// A fully specified outbound query, relative to the catalog base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    /// Endpoint path relative to the API root (no leading slash).
    pub path: String,
    /// Query parameters in serialization order.
    pub params: Vec<(String, String)>,
    /// Per-call cache lifetime override in seconds.
    pub cache_seconds: Option<u64>,
}

impl BuiltQuery {
    fn new(path: String, language: &str) -> Self {
        Self {
            path,
            params: vec![(String::from("language"), String::from(language))],
            cache_seconds: None,
        }
    }

    fn push(&mut self, key: &str, value: impl Into<String>) {
        self.params.push((String::from(key), value.into()));
    }

    /// Looks up a parameter value by key.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// URL-encoded query string (without the leading `?`).
    #[must_use]
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.params)
            .finish()
    }

    /// Resolves the query against `base` into a fully-qualified URL.
    ///
    /// The resulting string doubles as the response cache key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` if the path cannot be joined onto `base`.
    pub fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base
            .join(&self.path)
            .map_err(|e| CatalogError::invalid(format!("bad path {}: {e}", self.path)))?;
        url.query_pairs_mut().extend_pairs(&self.params);
        Ok(url)
    }
}

/// Builds validated upstream queries. Pure: no network, no cache.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    language: String,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl QueryBuilder {
    /// Creates a builder whose requests default to `language`.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Default response language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Builds a listing query (feed, discover or text search).
    ///
    /// `language` and `page` are always set. Search requests carry
    /// `query`; discover requests carry every defined filter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` when the page is 0, when a text query is
    /// combined with discover filters, when filters are given for a
    /// non-discover feed, or when a multi-kind scope is used with a feed
    /// that only exists per kind.
    pub fn listing(&self, query: &ListingQuery) -> Result<BuiltQuery> {
        if query.page < 1 {
            return Err(CatalogError::invalid("page must be >= 1"));
        }

        let text = query.effective_text();
        let has_filters = !query.filters.is_empty();

        if text.is_some() && has_filters {
            return Err(CatalogError::invalid(
                "text search cannot be combined with discover filters",
            ));
        }
        if text.is_none() && has_filters && query.feed != Feed::Discover {
            return Err(CatalogError::invalid(
                "discover filters require the discover feed",
            ));
        }

        let path = match text {
            Some(_) => format!("search/{}", scope_segment(query.scope)),
            None => feed_path(query.scope, query.feed)?,
        };

        let language = query.language.as_deref().unwrap_or(&self.language);
        let mut built = BuiltQuery::new(path, language);
        built.push("page", query.page.to_string());

        if let Some(text) = text {
            built.push("query", text);
        } else {
            built.params.extend(query.filters.to_params());
        }

        built.cache_seconds = query.cache_seconds;
        Ok(built)
    }

    /// Builds a per-item query (details, credits, videos, season, ...).
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` when the id is 0 or a season is requested
    /// for a movie.
    pub fn detail(&self, request: &DetailRequest) -> Result<BuiltQuery> {
        if request.id == 0 {
            return Err(CatalogError::invalid("id must be a positive integer"));
        }

        let kind = request.kind.as_path();
        let id = request.id;
        let path = match request.resource {
            DetailResource::Details => format!("{kind}/{id}"),
            DetailResource::Credits => format!("{kind}/{id}/credits"),
            DetailResource::Videos => format!("{kind}/{id}/videos"),
            DetailResource::Recommendations => format!("{kind}/{id}/recommendations"),
            DetailResource::WatchProviders => format!("{kind}/{id}/watch/providers"),
            DetailResource::Season(n) | DetailResource::SeasonVideos(n)
                if request.kind != MediaKind::Tv =>
            {
                return Err(CatalogError::invalid(format!(
                    "season {n} requested for a {kind}"
                )));
            }
            DetailResource::Season(n) => format!("tv/{id}/season/{n}"),
            DetailResource::SeasonVideos(n) => format!("tv/{id}/season/{n}/videos"),
        };

        let language = request.language.as_deref().unwrap_or(&self.language);
        let mut built = BuiltQuery::new(path, language);
        if request.resource == DetailResource::Recommendations {
            built.push("page", "1");
        }
        built.cache_seconds = request.cache_seconds;
        Ok(built)
    }
}

const fn scope_segment(scope: ListingScope) -> &'static str {
    match scope {
        ListingScope::Kind(kind) => kind.as_path(),
        ListingScope::Multi => "multi",
    }
}

fn feed_path(scope: ListingScope, feed: Feed) -> Result<String> {
    if let Feed::Trending(window) = feed {
        let segment = match scope {
            ListingScope::Kind(kind) => kind.as_path(),
            ListingScope::Multi => "all",
        };
        return Ok(format!("trending/{segment}/{}", window.as_path()));
    }

    let ListingScope::Kind(kind) = scope else {
        return Err(CatalogError::invalid(
            "multi-kind listings need a text query or the trending feed",
        ));
    };

    let path = match (feed, kind) {
        (Feed::Popular, _) => format!("{kind}/popular"),
        (Feed::TopRated, _) => format!("{kind}/top_rated"),
        (Feed::Upcoming, MediaKind::Movie) => String::from("movie/upcoming"),
        (Feed::Upcoming, MediaKind::Tv) => String::from("tv/on_the_air"),
        (Feed::Discover | Feed::Trending(_), _) => format!("discover/{kind}"),
    };
    Ok(path)
}
