//! Logical request types handed to the query builder.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Media kind served by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Feature film.
    Movie,
    /// TV series.
    Tv,
}

impl MediaKind {
    /// Path segment used by the upstream endpoint families.
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    /// Parses an upstream `media_type` tag. Anything but `movie`/`tv` is `None`.
    #[must_use]
    pub fn from_media_type(tag: &str) -> Option<Self> {
        match tag {
            "movie" => Some(Self::Movie),
            "tv" => Some(Self::Tv),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Which media kinds a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    /// A single media kind.
    Kind(MediaKind),
    /// Movies and TV mixed (multi search, trending/all).
    Multi,
}

impl From<MediaKind> for ListingScope {
    fn from(kind: MediaKind) -> Self {
        Self::Kind(kind)
    }
}

/// Time window for trending listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    /// Trending today.
    #[default]
    Day,
    /// Trending this week.
    Week,
}

impl TimeWindow {
    pub(crate) const fn as_path(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

/// Listing family used when no text query is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Feed {
    /// `{kind}/popular`.
    Popular,
    /// `{kind}/top_rated`.
    TopRated,
    /// `trending/{kind|all}/{window}`.
    Trending(TimeWindow),
    /// `movie/upcoming` or `tv/on_the_air`.
    Upcoming,
    /// `discover/{kind}` with filters.
    #[default]
    Discover,
}

/// A single discover filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Free text (`sort_by`, dates, language codes, ...).
    Text(String),
    /// Whole number (`year`, `vote_count.gte`, ...).
    Integer(i64),
    /// Decimal number (`vote_average.gte`, ...).
    Decimal(f64),
    /// Boolean switch (`include_adult`, ...).
    Flag(bool),
    /// Set of values, serialized comma-joined.
    List(Vec<String>),
}

impl FilterValue {
    /// Serializes the value for the query string.
    ///
    /// Returns `None` when the value would serialize to an empty string;
    /// such filters are left out of the request entirely.
    #[must_use]
    pub fn serialize(&self) -> Option<String> {
        let raw = match self {
            Self::Text(text) => text.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Decimal(n) => n.to_string(),
            Self::Flag(b) => b.to_string(),
            Self::List(items) => items
                .iter()
                .map(String::as_str)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(","),
        };
        (!raw.is_empty()).then_some(raw)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl<T: ToString> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.iter().map(ToString::to_string).collect())
    }
}

impl<T: ToString> From<&[T]> for FilterValue {
    fn from(values: &[T]) -> Self {
        Self::List(values.iter().map(ToString::to_string).collect())
    }
}

/// Discover filters keyed by upstream parameter name.
///
/// Keys are kept sorted so identical filter sets always produce the same
/// query string (and therefore the same cache key).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscoverFilters {
    values: BTreeMap<String, FilterValue>,
}

impl DiscoverFilters {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an arbitrary filter by its upstream name.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Sets an optional filter; `None` leaves the key unset.
    #[must_use]
    pub fn set_opt<V: Into<FilterValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    /// Genre ids (`with_genres`).
    #[must_use]
    pub fn with_genres<T: ToString>(self, ids: &[T]) -> Self {
        self.set("with_genres", ids)
    }

    /// Keyword ids (`with_keywords`).
    #[must_use]
    pub fn with_keywords<T: ToString>(self, ids: &[T]) -> Self {
        self.set("with_keywords", ids)
    }

    /// Cast person ids (`with_cast`).
    #[must_use]
    pub fn with_cast<T: ToString>(self, ids: &[T]) -> Self {
        self.set("with_cast", ids)
    }

    /// Person ids in cast or crew (`with_people`).
    #[must_use]
    pub fn with_people<T: ToString>(self, ids: &[T]) -> Self {
        self.set("with_people", ids)
    }

    /// Watch provider ids (`with_watch_providers`).
    #[must_use]
    pub fn with_watch_providers<T: ToString>(self, ids: &[T]) -> Self {
        self.set("with_watch_providers", ids)
    }

    /// Sort order, e.g. `popularity.desc`.
    #[must_use]
    pub fn sort_by(self, order: impl Into<String>) -> Self {
        self.set("sort_by", order.into())
    }

    /// Release year.
    #[must_use]
    pub fn year(self, year: u32) -> Self {
        self.set("year", year)
    }

    /// Primary release year.
    #[must_use]
    pub fn primary_release_year(self, year: u32) -> Self {
        self.set("primary_release_year", year)
    }

    /// Adult content switch.
    #[must_use]
    pub fn include_adult(self, include: bool) -> Self {
        self.set("include_adult", include)
    }

    /// Lower bound on the vote average.
    #[must_use]
    pub fn vote_average_gte(self, value: f64) -> Self {
        self.set("vote_average.gte", value)
    }

    /// Lower bound on the vote count.
    #[must_use]
    pub fn vote_count_gte(self, value: u32) -> Self {
        self.set("vote_count.gte", value)
    }

    /// Earliest release date (`YYYY-MM-DD`).
    #[must_use]
    pub fn release_date_gte(self, date: impl Into<String>) -> Self {
        self.set("release_date.gte", date.into())
    }

    /// Latest release date (`YYYY-MM-DD`).
    #[must_use]
    pub fn release_date_lte(self, date: impl Into<String>) -> Self {
        self.set("release_date.lte", date.into())
    }

    /// Original language (ISO 639-1).
    #[must_use]
    pub fn with_original_language(self, language: impl Into<String>) -> Self {
        self.set("with_original_language", language.into())
    }

    /// Origin country (ISO 3166-1).
    #[must_use]
    pub fn with_origin_country(self, country: impl Into<String>) -> Self {
        self.set("with_origin_country", country.into())
    }

    /// Returns `true` when no filter serializes to a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.serialize().is_none())
    }

    /// Serialized `(key, value)` pairs, undefined/empty values omitted.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .filter_map(|(key, value)| value.serialize().map(|v| (key.clone(), v)))
            .collect()
    }
}

/// A listing request as the presentation layer expresses it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    /// Media kinds covered.
    pub scope: ListingScope,
    /// Listing family used when `text_query` is unset.
    pub feed: Feed,
    /// Free-text search. Blank text counts as unset.
    pub text_query: Option<String>,
    /// Result page (1-based).
    pub page: u32,
    /// Response language; the builder default applies when `None`.
    pub language: Option<String>,
    /// Discover filters. Must be empty when `text_query` is set.
    pub filters: DiscoverFilters,
    /// Per-call cache lifetime override in seconds.
    pub cache_seconds: Option<u64>,
}

impl ListingQuery {
    /// Creates a page-1 discover query for the given scope.
    pub fn new(scope: impl Into<ListingScope>) -> Self {
        Self {
            scope: scope.into(),
            feed: Feed::default(),
            text_query: None,
            page: 1,
            language: None,
            filters: DiscoverFilters::default(),
            cache_seconds: None,
        }
    }

    /// Creates a text-search query.
    pub fn search(scope: impl Into<ListingScope>, text: impl Into<String>) -> Self {
        Self::new(scope).text(text)
    }

    /// Sets the listing family.
    #[must_use]
    pub const fn feed(mut self, feed: Feed) -> Self {
        self.feed = feed;
        self
    }

    /// Sets the text query.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text_query = Some(text.into());
        self
    }

    /// Sets the page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Replaces the discover filters.
    #[must_use]
    pub fn filters(mut self, filters: DiscoverFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Overrides the cache lifetime for this call.
    #[must_use]
    pub const fn cache_seconds(mut self, seconds: u64) -> Self {
        self.cache_seconds = Some(seconds);
        self
    }

    /// The text query with surrounding whitespace removed, if non-blank.
    #[must_use]
    pub fn effective_text(&self) -> Option<&str> {
        self.text_query
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Per-item subresource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailResource {
    /// `{kind}/{id}`.
    Details,
    /// `{kind}/{id}/credits`.
    Credits,
    /// `{kind}/{id}/videos`.
    Videos,
    /// `{kind}/{id}/recommendations`.
    Recommendations,
    /// `{kind}/{id}/watch/providers`.
    WatchProviders,
    /// `tv/{id}/season/{n}`.
    Season(u32),
    /// `tv/{id}/season/{n}/videos`.
    SeasonVideos(u32),
}

/// A request for one item (or one of its subresources).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    /// Media kind of the item.
    pub kind: MediaKind,
    /// Upstream item id (must be positive).
    pub id: u64,
    /// Requested subresource.
    pub resource: DetailResource,
    /// Response language; the builder default applies when `None`.
    pub language: Option<String>,
    /// Per-call cache lifetime override in seconds.
    pub cache_seconds: Option<u64>,
}

impl DetailRequest {
    /// Creates a request for `resource` of item `id`.
    #[must_use]
    pub const fn new(kind: MediaKind, id: u64, resource: DetailResource) -> Self {
        Self {
            kind,
            id,
            resource,
            language: None,
            cache_seconds: None,
        }
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: Option<&str>) -> Self {
        self.language = language.map(String::from);
        self
    }
}

/// Parses the numeric id at the front of a route slug such as `"603-the-matrix"`.
///
/// # Errors
///
/// Returns `InvalidQuery` when the slug does not start with a positive integer.
pub fn parse_slug_id(slug: &str) -> Result<u64> {
    let trimmed = slug.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let digits = trimmed.get(..digits_end).unwrap_or_default();
    match digits.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CatalogError::invalid(format!(
            "id must be a positive integer: {slug:?}"
        ))),
    }
}
