//! Credits, videos, seasons and watch providers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::listing::present;
use super::{malformed, readable_entries};
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct RawPerson {
    id: Option<u64>,
    name: Option<String>,
    original_name: Option<String>,
    profile_path: Option<String>,
    character: Option<String>,
    job: Option<String>,
    department: Option<String>,
}

/// Cast or crew member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    /// Person id.
    pub id: u64,
    /// Credited name.
    pub name: String,
    /// Name in the original language.
    pub original_name: Option<String>,
    /// Profile image path.
    pub profile_path: Option<String>,
    /// Role played (cast).
    pub character: Option<String>,
    /// Job held (crew).
    pub job: Option<String>,
    /// Crew department.
    pub department: Option<String>,
}

/// Cast and crew of a title.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CreditsRecord {
    /// Cast in billing order.
    pub cast: Vec<Person>,
    /// Crew in upstream order.
    pub crew: Vec<Person>,
}

#[derive(Debug, Deserialize)]
struct RawCredits {
    cast: Option<Vec<Value>>,
    crew: Option<Vec<Value>>,
}

/// A video attached to a title or season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Site-specific video key.
    pub key: String,
    /// Hosting site ("YouTube", "Vimeo", ...).
    pub site: Option<String>,
    /// Video type ("Trailer", "Teaser", "Featurette", ...).
    #[serde(rename = "type")]
    pub video_type: Option<String>,
    /// Video title.
    pub name: Option<String>,
}

impl VideoRecord {
    fn is_type(&self, wanted: &str) -> bool {
        self.video_type.as_deref() == Some(wanted)
    }
}

#[derive(Debug, Deserialize)]
struct RawVideos {
    results: Option<Vec<Value>>,
}

/// An episode of a season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeRecord {
    /// Episode id.
    pub id: u64,
    /// Number within the season.
    pub episode_number: u32,
    /// Episode title.
    pub name: Option<String>,
    /// Synopsis.
    pub overview: Option<String>,
    /// Air date.
    pub air_date: Option<String>,
    /// Still image path.
    pub still_path: Option<String>,
    /// Runtime in minutes; zero counts as unknown.
    pub runtime: Option<u32>,
    /// Average rating.
    pub vote_average: Option<f64>,
    /// Upstream episode tag ("standard", "finale", ...).
    pub episode_type: Option<String>,
    /// Episode crew.
    pub crew: Vec<Person>,
    /// Guest stars.
    pub guest_stars: Vec<Person>,
}

#[derive(Debug, Deserialize)]
struct RawEpisode {
    id: u64,
    episode_number: u32,
    name: Option<String>,
    overview: Option<String>,
    air_date: Option<String>,
    still_path: Option<String>,
    runtime: Option<u32>,
    vote_average: Option<f64>,
    episode_type: Option<String>,
    crew: Option<Vec<Value>>,
    guest_stars: Option<Vec<Value>>,
}

/// One season of a series with its episodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonDetail {
    /// Season number.
    pub season_number: u32,
    /// Season name.
    pub name: Option<String>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// First air date.
    pub air_date: Option<String>,
    /// Average rating.
    pub vote_average: Option<f64>,
    /// Synopsis.
    pub overview: Option<String>,
    /// Episodes in order.
    pub episodes: Vec<EpisodeRecord>,
}

#[derive(Debug, Deserialize)]
struct RawSeason {
    season_number: Option<u32>,
    name: Option<String>,
    poster_path: Option<String>,
    air_date: Option<String>,
    vote_average: Option<f64>,
    overview: Option<String>,
    episodes: Option<Vec<Value>>,
}

/// A streaming/rental/purchase provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Provider id (usable as a discover filter).
    pub provider_id: u64,
    /// Display name.
    pub provider_name: String,
    /// Logo image path.
    pub logo_path: Option<String>,
    /// Upstream ordering hint.
    pub display_priority: Option<i64>,
}

/// Offers for one region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegionProviders {
    /// Link to the upstream provider page for this region.
    pub link: Option<String>,
    /// Subscription streaming.
    #[serde(default)]
    pub flatrate: Vec<Provider>,
    /// Rental.
    #[serde(default)]
    pub rent: Vec<Provider>,
    /// Purchase.
    #[serde(default)]
    pub buy: Vec<Provider>,
}

/// Watch providers keyed by ISO 3166-1 region code.
pub type WatchProviders = BTreeMap<String, RegionProviders>;

#[derive(Debug, Deserialize)]
struct RawWatchProviders {
    results: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawRegion {
    link: Option<String>,
    flatrate: Option<Vec<Value>>,
    rent: Option<Vec<Value>>,
    buy: Option<Vec<Value>>,
}

fn normalize_people(raw: Option<Vec<Value>>, context: &str) -> Vec<Person> {
    readable_entries::<RawPerson>(raw, context)
        .into_iter()
        .filter_map(|p| {
            Some(Person {
                id: p.id?,
                name: present(p.name).or_else(|| p.original_name.clone())?,
                original_name: present(p.original_name),
                profile_path: present(p.profile_path),
                character: present(p.character),
                job: present(p.job),
                department: present(p.department),
            })
        })
        .collect()
}

/// Normalizes a credits object. People without an id or any name are dropped.
///
/// # Errors
///
/// Returns `MalformedResponse` when a field has an unexpected type.
pub fn normalize_credits(value: Value) -> Result<CreditsRecord> {
    let raw: RawCredits =
        serde_json::from_value(value).map_err(|e| malformed("credits", e))?;
    Ok(CreditsRecord {
        cast: normalize_people(raw.cast, "cast"),
        crew: normalize_people(raw.crew, "crew"),
    })
}

/// Normalizes a videos envelope; entries without a key are dropped.
///
/// # Errors
///
/// Returns `MalformedResponse` when `results` is missing.
pub fn normalize_videos(value: Value) -> Result<Vec<VideoRecord>> {
    let raw: RawVideos = serde_json::from_value(value).map_err(|e| malformed("videos", e))?;
    let results = raw
        .results
        .ok_or_else(|| malformed("videos", "no results array"))?;
    Ok(readable_entries::<VideoRecord>(Some(results), "videos")
        .into_iter()
        .filter(|v| !v.key.is_empty())
        .collect())
}

/// Picks the video to offer as a trailer.
///
/// First `"Trailer"`, else first `"Teaser"`, else the first video of any
/// type; `None` for an empty list.
#[must_use]
pub fn select_trailer(videos: &[VideoRecord]) -> Option<&VideoRecord> {
    videos
        .iter()
        .find(|v| v.is_type("Trailer"))
        .or_else(|| videos.iter().find(|v| v.is_type("Teaser")))
        .or_else(|| videos.first())
}

/// Normalizes a season object. Episodes without an id or number are dropped.
///
/// # Errors
///
/// Returns `MalformedResponse` when a season-level field has an unexpected
/// type.
pub fn normalize_season(value: Value, season_number: u32) -> Result<SeasonDetail> {
    let raw: RawSeason = serde_json::from_value(value).map_err(|e| malformed("season", e))?;
    let episodes = readable_entries::<RawEpisode>(raw.episodes, "episodes")
        .into_iter()
        .map(|e| EpisodeRecord {
            id: e.id,
            episode_number: e.episode_number,
            name: present(e.name),
            overview: present(e.overview),
            air_date: present(e.air_date),
            still_path: present(e.still_path),
            runtime: e.runtime.filter(|minutes| *minutes > 0),
            vote_average: e.vote_average,
            episode_type: present(e.episode_type),
            crew: normalize_people(e.crew, "episode crew"),
            guest_stars: normalize_people(e.guest_stars, "guest stars"),
        })
        .collect();

    Ok(SeasonDetail {
        season_number: raw.season_number.unwrap_or(season_number),
        name: present(raw.name),
        poster_path: present(raw.poster_path),
        air_date: present(raw.air_date),
        vote_average: raw.vote_average,
        overview: present(raw.overview),
        episodes,
    })
}

/// Normalizes a watch-providers envelope. A missing `results` is no offers.
///
/// Regions that are not objects and providers without an id or name are
/// dropped.
///
/// # Errors
///
/// Returns `MalformedResponse` when `results` is not an object.
pub fn normalize_watch_providers(value: Value) -> Result<WatchProviders> {
    let raw: RawWatchProviders =
        serde_json::from_value(value).map_err(|e| malformed("watch providers", e))?;
    Ok(raw
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(region, offers)| {
            let offers: RawRegion = serde_json::from_value(offers).ok()?;
            Some((
                region,
                RegionProviders {
                    link: present(offers.link),
                    flatrate: readable_entries(offers.flatrate, "flatrate providers"),
                    rent: readable_entries(offers.rent, "rent providers"),
                    buy: readable_entries(offers.buy, "buy providers"),
                },
            ))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use serde_json::json;

    use super::*;
    use crate::error::CatalogError;

    fn video(kind: &str, key: &str) -> VideoRecord {
        VideoRecord {
            key: String::from(key),
            site: Some(String::from("YouTube")),
            video_type: Some(String::from(kind)),
            name: None,
        }
    }

    #[test]
    fn test_trailer_preferred_over_teaser() {
        // Arrange
        let videos = vec![video("Teaser", "a"), video("Trailer", "b")];

        // Act
        let picked = select_trailer(&videos);

        // Assert
        assert_eq!(picked.map(|v| v.key.as_str()), Some("b"));
    }

    #[test]
    fn test_teaser_alone_is_selected() {
        // Arrange
        let videos = vec![video("Teaser", "a")];

        // Act & Assert
        assert_eq!(select_trailer(&videos).map(|v| v.key.as_str()), Some("a"));
    }

    #[test]
    fn test_teaser_preferred_over_other_types() {
        // Arrange
        let videos = vec![video("Bloopers", "x"), video("Teaser", "t")];

        // Act & Assert
        assert_eq!(select_trailer(&videos).map(|v| v.key.as_str()), Some("t"));
    }

    #[test]
    fn test_any_video_as_last_resort() {
        // Arrange
        let videos = vec![video("Bloopers", "x"), video("Featurette", "y")];

        // Act & Assert
        assert_eq!(select_trailer(&videos).map(|v| v.key.as_str()), Some("x"));
        assert!(select_trailer(&[]).is_none());
    }

    #[test]
    fn test_normalize_videos_reads_type_field() {
        // Arrange
        let value = json!({"id": 603, "results": [
            {"key": "abc", "site": "YouTube", "type": "Trailer", "name": "Official Trailer"},
            {"site": "YouTube", "type": "Teaser"}
        ]});

        // Act
        let videos = normalize_videos(value).unwrap();

        // Assert
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].video_type.as_deref(), Some("Trailer"));
    }

    #[test]
    fn test_credits_keep_order_and_drop_anonymous() {
        // Arrange
        let value = json!({
            "id": 603,
            "cast": [
                {"id": 6384, "name": "Keanu Reeves", "original_name": "Keanu Reeves", "character": "Neo", "profile_path": "/k.jpg"},
                {"name": "No Id"},
                {"id": 2975, "name": "Laurence Fishburne", "character": "Morpheus"}
            ],
            "crew": [
                {"id": 9339, "name": "Lana Wachowski", "job": "Director", "department": "Directing"}
            ]
        });

        // Act
        let credits = normalize_credits(value).unwrap();

        // Assert
        let cast: Vec<&str> = credits.cast.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(cast, vec!["Keanu Reeves", "Laurence Fishburne"]);
        assert_eq!(credits.cast[0].character.as_deref(), Some("Neo"));
        assert_eq!(credits.cast[1].profile_path, None);
        assert_eq!(credits.crew[0].job.as_deref(), Some("Director"));
    }

    #[test]
    fn test_credits_missing_lists_are_empty() {
        // Arrange & Act
        let credits = normalize_credits(json!({"id": 1})).unwrap();

        // Assert
        assert_eq!(credits, CreditsRecord::default());
    }

    #[test]
    fn test_season_with_episodes() {
        // Arrange
        let value = json!({
            "_id": "5256c89f19c2956ff6046d47",
            "air_date": "2011-04-17",
            "name": "Season 1",
            "overview": "",
            "poster_path": "/s1.jpg",
            "season_number": 1,
            "vote_average": 8.3,
            "episodes": [{
                "id": 63056,
                "episode_number": 1,
                "name": "Winter Is Coming",
                "air_date": "2011-04-17",
                "runtime": 62,
                "episode_type": "standard",
                "crew": [{"id": 44797, "name": "Tim Van Patten", "job": "Director"}],
                "guest_stars": [{"id": 117642, "name": "Jason Momoa", "character": "Khal Drogo"}]
            }, {
                "id": 63065,
                "episode_number": 10,
                "name": "Fire and Blood",
                "runtime": 0,
                "episode_type": "finale"
            }]
        });

        // Act
        let season = normalize_season(value, 1).unwrap();

        // Assert
        assert_eq!(season.name.as_deref(), Some("Season 1"));
        assert_eq!(season.overview, None);
        assert_eq!(season.episodes.len(), 2);
        assert_eq!(season.episodes[0].guest_stars[0].name, "Jason Momoa");
        assert_eq!(season.episodes[1].runtime, None);
        assert_eq!(season.episodes[1].episode_type.as_deref(), Some("finale"));
    }

    #[test]
    fn test_season_drops_unreadable_episodes() {
        // Arrange
        let value = json!({
            "season_number": 1,
            "episodes": [
                {"id": 1, "episode_number": 1},
                {"id": 2, "name": "x"},
                {"episode_number": 3, "name": "No id"},
                {"id": 4, "episode_number": 4, "crew": [{"id": "bad"}, {"id": 9, "name": "Writer"}]}
            ]
        });

        // Act
        let season = normalize_season(value, 1).unwrap();

        // Assert
        let numbers: Vec<u32> = season.episodes.iter().map(|e| e.episode_number).collect();
        assert_eq!(numbers, vec![1, 4]);
        assert_eq!(season.episodes[0].name, None);
        assert_eq!(season.episodes[1].crew.len(), 1);
        assert_eq!(season.episodes[1].crew[0].name, "Writer");
    }

    #[test]
    fn test_season_without_episodes_uses_requested_number() {
        // Arrange & Act
        let season = normalize_season(json!({"name": "Specials"}), 0).unwrap();

        // Assert
        assert_eq!(season.season_number, 0);
        assert!(season.episodes.is_empty());
    }

    #[test]
    fn test_watch_providers_drop_partial_entries() {
        // Arrange
        let value = json!({"results": {
            "US": {"flatrate": [{"provider_id": 8}, {"provider_id": 9, "provider_name": "Prime Video"}]},
            "XX": "not an object"
        }});

        // Act
        let providers = normalize_watch_providers(value).unwrap();

        // Assert
        assert_eq!(providers.len(), 1);
        assert_eq!(providers["US"].flatrate.len(), 1);
        assert_eq!(providers["US"].flatrate[0].provider_name, "Prime Video");
        assert_eq!(providers["US"].link, None);
    }

    #[test]
    fn test_missing_video_results_is_malformed() {
        // Arrange & Act
        let err = normalize_videos(json!({"id": 603})).unwrap_err();

        // Assert
        assert!(matches!(err, CatalogError::MalformedResponse(_)));
    }

    #[test]
    fn test_watch_providers_by_region() {
        // Arrange
        let value = json!({"id": 603, "results": {
            "US": {
                "link": "https://www.themoviedb.org/movie/603-the-matrix/watch?locale=US",
                "flatrate": [{"provider_id": 8, "provider_name": "Netflix", "logo_path": "/n.jpg", "display_priority": 0}],
                "rent": [{"provider_id": 2, "provider_name": "Apple TV", "logo_path": "/a.jpg", "display_priority": 4}]
            },
            "JP": {"link": "https://www.themoviedb.org/movie/603-the-matrix/watch?locale=JP"}
        }});

        // Act
        let providers = normalize_watch_providers(value).unwrap();

        // Assert
        let us = &providers["US"];
        assert_eq!(us.flatrate[0].provider_name, "Netflix");
        assert_eq!(us.rent.len(), 1);
        assert!(us.buy.is_empty());
        assert!(providers["JP"].flatrate.is_empty());
    }
}
