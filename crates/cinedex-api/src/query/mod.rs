//! Outbound query construction.
//!
//! Turns listing and per-item requests into endpoint paths plus query
//! parameters for the TMDB v3 API.

mod builder;
mod params;

#[allow(clippy::module_name_repetitions)]
pub use builder::{BuiltQuery, DEFAULT_LANGUAGE, QueryBuilder};
pub use params::{
    DetailRequest, DetailResource, DiscoverFilters, Feed, FilterValue, ListingQuery,
    ListingScope, MediaKind, TimeWindow, parse_slug_id,
};
