//! Response normalization.
//!
//! Upstream endpoint families answer with different envelope shapes
//! (per-kind lists, mixed multi-search lists, single detail objects and
//! season collections). Each shape is parsed into lenient raw structs and
//! mapped into one canonical type, so consumers never touch raw JSON.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CatalogError;

mod detail;
mod listing;
mod media;

pub use detail::{
    Collection, Company, DetailRecord, Genre, KindFacts, MovieFacts, SeasonSummary,
    SpokenLanguage, TvFacts, normalize_detail,
};
pub use listing::{
    ListShape, MAX_TOTAL_PAGES, NormalizedListing, NormalizedListingItem, normalize_listing,
    release_year, resolve_title,
};
pub use media::{
    CreditsRecord, EpisodeRecord, Person, Provider, RegionProviders, SeasonDetail, VideoRecord,
    WatchProviders, normalize_credits, normalize_season, normalize_videos,
    normalize_watch_providers, select_trailer,
};

/// Builds a `MalformedResponse` for `context` and logs it.
pub(crate) fn malformed(context: &str, detail: impl fmt::Display) -> CatalogError {
    tracing::warn!(context, %detail, "malformed catalog response");
    CatalogError::MalformedResponse(format!("{context}: {detail}"))
}

/// Reads each entry on its own and drops the ones that do not fit `T`.
///
/// A missing array reads as empty. Dropped entries are reported with a
/// single warning per call.
pub(crate) fn readable_entries<T: DeserializeOwned>(
    entries: Option<Vec<Value>>,
    context: &str,
) -> Vec<T> {
    let entries = entries.unwrap_or_default();
    let total = entries.len();
    let mut unreadable = 0_usize;
    let mut kept = Vec::with_capacity(total);
    for entry in entries {
        match serde_json::from_value::<T>(entry) {
            Ok(item) => kept.push(item),
            Err(_) => unreadable = unreadable.saturating_add(1),
        }
    }
    if unreadable > 0 {
        tracing::warn!(context, unreadable, total, "dropped unreadable entries");
    }
    kept
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;

    #[derive(Debug, Deserialize, PartialEq, Eq)]
    struct Tag {
        id: u64,
        name: String,
    }

    #[test]
    fn test_readable_entries_drops_partial_entries() {
        // Arrange
        let entries = vec![
            json!({"id": 1, "name": "Drama"}),
            json!({"id": 2}),
            json!({"name": "No id"}),
            json!("not an object"),
        ];

        // Act
        let tags: Vec<Tag> = readable_entries(Some(entries), "tags");

        // Assert
        assert_eq!(
            tags,
            vec![Tag {
                id: 1,
                name: String::from("Drama")
            }]
        );
    }

    #[test]
    fn test_readable_entries_missing_array_is_empty() {
        // Arrange & Act
        let tags: Vec<Tag> = readable_entries(None, "tags");

        // Assert
        assert!(tags.is_empty());
    }

    #[test]
    fn test_malformed_is_logged() {
        // Arrange
        let (subscriber, handle) = subscriber::mock()
            .event(expect::event().at_level(tracing::Level::WARN))
            .only()
            .run_with_handle();

        // Act
        let err = with_default(subscriber, || malformed("videos", "no results"));

        // Assert
        handle.assert_finished();
        assert_eq!(
            err,
            CatalogError::MalformedResponse(String::from("videos: no results"))
        );
    }
}
