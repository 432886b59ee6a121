//! Listing envelopes (`{page, results, total_pages}`) into `NormalizedListing`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{malformed, readable_entries};
use crate::error::Result;
use crate::query::{ListingScope, MediaKind};

/// Highest page count ever offered to the presentation layer.
pub const MAX_TOTAL_PAGES: u32 = 100;

/// Literal used when an item carries no usable title.
const FALLBACK_TITLE: &str = "Title";

/// How the kind of each listed item is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// Every item has the given kind.
    Kind(MediaKind),
    /// Each item names its own kind in `media_type`.
    Mixed,
}

impl From<MediaKind> for ListShape {
    fn from(kind: MediaKind) -> Self {
        Self::Kind(kind)
    }
}

impl From<ListingScope> for ListShape {
    fn from(scope: ListingScope) -> Self {
        match scope {
            ListingScope::Kind(kind) => Self::Kind(kind),
            ListingScope::Multi => Self::Mixed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawListEnvelope {
    page: Option<u32>,
    results: Option<Vec<Value>>,
    total_pages: Option<u64>,
}

/// Fields shared by movie, TV and multi-search list items.
#[derive(Debug, Deserialize)]
struct RawListItem {
    id: u64,
    media_type: Option<String>,
    title: Option<String>,
    original_title: Option<String>,
    name: Option<String>,
    original_name: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    vote_average: Option<f64>,
    overview: Option<String>,
}

/// One card in a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedListingItem {
    /// Upstream id.
    pub id: u64,
    /// Kind of the item.
    pub media_kind: MediaKind,
    /// Resolved display title.
    pub title: String,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Year from the release or first-air date.
    pub release_year: Option<String>,
    /// Average rating.
    pub vote_average: Option<f64>,
    /// Synopsis.
    pub overview: Option<String>,
}

impl NormalizedListingItem {
    /// Route slug: `"{id}-{title-lowercased-and-hyphenated}"`.
    #[must_use]
    pub fn slug(&self) -> String {
        let words: Vec<&str> = self.title.split_whitespace().collect();
        format!("{}-{}", self.id, words.join("-").to_lowercase())
    }

    /// Poster path, falling back to the backdrop.
    #[must_use]
    pub fn image_path(&self) -> Option<&str> {
        self.poster_path.as_deref().or(self.backdrop_path.as_deref())
    }
}

/// A page of listing results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedListing {
    /// Displayable items in upstream order.
    pub items: Vec<NormalizedListingItem>,
    /// Page number reported upstream.
    pub page: u32,
    /// Total pages, clamped to [`MAX_TOTAL_PAGES`].
    pub total_pages: u32,
    /// Text query the listing answers, if any.
    pub query: Option<String>,
}

/// Normalizes a listing envelope.
///
/// Items that fail to parse, have no image, or (for mixed lists) carry an
/// unknown `media_type` are dropped.
///
/// # Errors
///
/// Returns `MalformedResponse` when the envelope has no `results` array.
pub fn normalize_listing(
    value: Value,
    shape: ListShape,
    query: Option<&str>,
    requested_page: u32,
) -> Result<NormalizedListing> {
    let envelope: RawListEnvelope =
        serde_json::from_value(value).map_err(|e| malformed("listing envelope", e))?;
    let results = envelope
        .results
        .ok_or_else(|| malformed("listing", "no results array"))?;

    let items = readable_entries::<RawListItem>(Some(results), "listing items")
        .into_iter()
        .filter_map(|item| normalize_item(item, shape))
        .collect();

    Ok(NormalizedListing {
        items,
        page: envelope.page.unwrap_or(requested_page),
        total_pages: clamp_total_pages(envelope.total_pages),
        query: query.map(String::from),
    })
}

fn normalize_item(raw: RawListItem, shape: ListShape) -> Option<NormalizedListingItem> {
    let media_kind = match shape {
        ListShape::Kind(kind) => kind,
        ListShape::Mixed => MediaKind::from_media_type(raw.media_type.as_deref()?)?,
    };

    let poster_path = present(raw.poster_path);
    let backdrop_path = present(raw.backdrop_path);
    if poster_path.is_none() && backdrop_path.is_none() {
        return None;
    }

    let title = resolve_title([
        raw.title.as_deref(),
        raw.original_title.as_deref(),
        raw.name.as_deref(),
        raw.original_name.as_deref(),
    ]);
    let release_year = release_year(raw.release_date.as_deref())
        .or_else(|| release_year(raw.first_air_date.as_deref()));

    Some(NormalizedListingItem {
        id: raw.id,
        media_kind,
        title,
        poster_path,
        backdrop_path,
        release_year,
        vote_average: raw.vote_average,
        overview: present(raw.overview),
    })
}

/// First non-blank candidate, or the literal `"Title"`.
#[must_use]
pub fn resolve_title<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|t| !t.trim().is_empty())
        .map_or_else(|| String::from(FALLBACK_TITLE), String::from)
}

/// Year prefix (first four characters) of an upstream date.
#[must_use]
pub fn release_year(date: Option<&str>) -> Option<String> {
    let date = date?.trim();
    if date.is_empty() {
        return None;
    }
    let year: String = date.chars().take(4).collect();
    Some(year)
}

/// `min(raw, 100)`; a missing value counts as a single page.
fn clamp_total_pages(raw: Option<u64>) -> u32 {
    let raw = raw.unwrap_or(1);
    u32::try_from(raw.min(u64::from(MAX_TOTAL_PAGES))).unwrap_or(MAX_TOTAL_PAGES)
}

/// Treats empty and whitespace-only strings as absent.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
