//! Catalog core for the cinedex browsing front-end.
//!
//! Builds outbound queries against the TMDB v3 API, serves them through a
//! time-bounded response cache, and normalizes the upstream envelopes into
//! the listing/detail shapes every page consumes.

/// Catalog facade exposed to the presentation layer.
pub mod catalog;
/// Response cache with injectable clock and storage backend.
pub mod cache;
/// Typed error taxonomy.
pub mod error;
/// Image URL helpers.
pub mod image;
/// Response normalization.
pub mod normalize;
/// Page-control planning.
pub mod pagination;
/// Outbound query construction.
pub mod query;
/// HTTP client for the remote catalog.
pub mod upstream;

pub use catalog::{Catalog, DetailPage, HomeFeed};
pub use error::{CatalogError, Result};
pub use pagination::{PageControl, PaginationWindow, plan_pagination};
