//! Remote catalog access.
//!
//! Executes built queries against the TMDB v3 API with bearer auth and
//! serves repeat requests from the response cache.

mod api;
mod client;

#[allow(clippy::module_name_repetitions)]
pub use api::{CatalogApi, LocalCatalogApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{CatalogClient, CatalogClientBuilder, DEFAULT_BASE_URL};
