//! Single-item detail objects into `DetailRecord`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::listing::{present, release_year, resolve_title};
use super::{malformed, readable_entries};
use crate::error::Result;
use crate::query::MediaKind;

#[derive(Debug, Deserialize)]
struct RawDetail {
    id: u64,
    title: Option<String>,
    original_title: Option<String>,
    name: Option<String>,
    original_name: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    last_air_date: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    overview: Option<String>,
    tagline: Option<String>,
    status: Option<String>,
    homepage: Option<String>,
    original_language: Option<String>,
    genres: Option<Vec<Value>>,
    spoken_languages: Option<Vec<Value>>,
    production_companies: Option<Vec<Value>>,
    origin_country: Option<Vec<Value>>,
    runtime: Option<u32>,
    budget: Option<i64>,
    revenue: Option<i64>,
    belongs_to_collection: Option<Value>,
    seasons: Option<Vec<Value>>,
    number_of_seasons: Option<u32>,
    number_of_episodes: Option<u32>,
}

/// Genre tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// Genre id (usable as a discover filter).
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// Spoken language entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpokenLanguage {
    /// ISO 639-1 code.
    pub iso_639_1: Option<String>,
    /// English name.
    pub english_name: Option<String>,
    /// Native name.
    pub name: Option<String>,
}

/// Production company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Company id.
    pub id: u64,
    /// Company name.
    pub name: String,
    /// Logo image path.
    pub logo_path: Option<String>,
    /// ISO 3166-1 country code.
    pub origin_country: Option<String>,
}

/// Collection a movie belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection id.
    pub id: u64,
    /// Collection name.
    pub name: String,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
}

/// Season entry embedded in a TV detail object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    /// Season id.
    pub id: u64,
    /// Season name ("Season 1", "Specials", ...).
    pub name: Option<String>,
    /// Season number (0 for specials).
    pub season_number: u32,
    /// Number of episodes.
    pub episode_count: Option<u32>,
    /// First air date.
    pub air_date: Option<String>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Average rating.
    pub vote_average: Option<f64>,
    /// Synopsis.
    pub overview: Option<String>,
}

/// Movie-only facts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieFacts {
    /// Runtime in minutes; zero counts as unknown.
    pub runtime: Option<u32>,
    /// Budget in USD; non-positive counts as unknown.
    pub budget: Option<u64>,
    /// Revenue in USD; non-positive counts as unknown.
    pub revenue: Option<u64>,
    /// Parent collection.
    pub belongs_to_collection: Option<Collection>,
}

/// TV-only facts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TvFacts {
    /// Seasons in upstream order.
    pub seasons: Vec<SeasonSummary>,
    /// Number of seasons.
    pub number_of_seasons: Option<u32>,
    /// Number of episodes.
    pub number_of_episodes: Option<u32>,
    /// First air date.
    pub first_air_date: Option<String>,
    /// Last air date.
    pub last_air_date: Option<String>,
}

/// Facts only one media kind carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "media_kind", rename_all = "lowercase")]
pub enum KindFacts {
    /// Movie facts.
    Movie(MovieFacts),
    /// TV facts.
    Tv(TvFacts),
}

/// Normalized detail page data for one movie or series.
///
/// Every optional field is `None` (or empty) when upstream omits it or
/// sends a value the product treats as unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRecord {
    /// Upstream id.
    pub id: u64,
    /// Kind of the item.
    pub media_kind: MediaKind,
    /// Resolved display title.
    pub title: String,
    /// Original title, only when it differs from `title`.
    pub original_title: Option<String>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Release date (movie) or first air date (TV).
    pub release_date: Option<String>,
    /// Year of `release_date`.
    pub release_year: Option<String>,
    /// Average rating.
    pub vote_average: Option<f64>,
    /// Number of votes.
    pub vote_count: Option<u64>,
    /// Synopsis.
    pub overview: Option<String>,
    /// Tagline.
    pub tagline: Option<String>,
    /// Production status ("Released", "Ended", ...).
    pub status: Option<String>,
    /// Official homepage.
    pub homepage: Option<String>,
    /// Original language (ISO 639-1).
    pub original_language: Option<String>,
    /// Genres.
    pub genres: Vec<Genre>,
    /// Spoken languages.
    pub spoken_languages: Vec<SpokenLanguage>,
    /// Production companies.
    pub production_companies: Vec<Company>,
    /// Origin countries (ISO 3166-1).
    pub origin_country: Vec<String>,
    /// Kind-specific facts.
    pub facts: KindFacts,
}

impl DetailRecord {
    /// Movie facts, if this is a movie.
    #[must_use]
    pub const fn movie(&self) -> Option<&MovieFacts> {
        match &self.facts {
            KindFacts::Movie(facts) => Some(facts),
            KindFacts::Tv(_) => None,
        }
    }

    /// TV facts, if this is a series.
    #[must_use]
    pub const fn tv(&self) -> Option<&TvFacts> {
        match &self.facts {
            KindFacts::Tv(facts) => Some(facts),
            KindFacts::Movie(_) => None,
        }
    }
}

/// Normalizes a movie or TV detail object.
///
/// # Errors
///
/// Returns `MalformedResponse` when the object has no numeric `id` or a
/// top-level field has an unexpected type. Nested entries that cannot be
/// read (a genre without a name, a season without a number) are dropped.
pub fn normalize_detail(value: Value, kind: MediaKind) -> Result<DetailRecord> {
    let raw: RawDetail =
        serde_json::from_value(value).map_err(|e| malformed(&format!("{kind} detail"), e))?;

    let title = match kind {
        MediaKind::Movie => resolve_title([
            raw.title.as_deref(),
            raw.original_title.as_deref(),
            raw.name.as_deref(),
            raw.original_name.as_deref(),
        ]),
        MediaKind::Tv => resolve_title([raw.name.as_deref(), raw.original_name.as_deref()]),
    };
    let original_title = present(match kind {
        MediaKind::Movie => raw.original_title,
        MediaKind::Tv => raw.original_name,
    })
    .filter(|original| *original != title);

    let first_air_date = present(raw.first_air_date);
    let release_date = match kind {
        MediaKind::Movie => present(raw.release_date),
        MediaKind::Tv => first_air_date.clone(),
    };

    let facts = match kind {
        MediaKind::Movie => KindFacts::Movie(MovieFacts {
            runtime: raw.runtime.filter(|minutes| *minutes > 0),
            budget: positive(raw.budget),
            revenue: positive(raw.revenue),
            belongs_to_collection: raw
                .belongs_to_collection
                .and_then(|v| serde_json::from_value(v).ok()),
        }),
        MediaKind::Tv => KindFacts::Tv(TvFacts {
            seasons: readable_entries(raw.seasons, "seasons"),
            number_of_seasons: raw.number_of_seasons,
            number_of_episodes: raw.number_of_episodes,
            first_air_date,
            last_air_date: present(raw.last_air_date),
        }),
    };

    Ok(DetailRecord {
        id: raw.id,
        media_kind: kind,
        title,
        original_title,
        poster_path: present(raw.poster_path),
        backdrop_path: present(raw.backdrop_path),
        release_year: release_year(release_date.as_deref()),
        release_date,
        vote_average: raw.vote_average,
        vote_count: raw.vote_count,
        overview: present(raw.overview),
        tagline: present(raw.tagline),
        status: present(raw.status),
        homepage: present(raw.homepage),
        original_language: present(raw.original_language),
        genres: readable_entries(raw.genres, "genres"),
        spoken_languages: readable_entries(raw.spoken_languages, "spoken languages"),
        production_companies: readable_entries(raw.production_companies, "companies"),
        origin_country: readable_entries(raw.origin_country, "origin country"),
        facts,
    })
}

fn positive(amount: Option<i64>) -> Option<u64> {
    amount.and_then(|n| u64::try_from(n).ok()).filter(|n| *n > 0)
}
