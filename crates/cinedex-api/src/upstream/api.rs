//! `CatalogApi` trait definition.
#![allow(clippy::future_not_send)]

use serde_json::Value;

use crate::error::Result;
use crate::query::BuiltQuery;

/// Raw access to the remote catalog.
///
/// Abstracts the transport so the catalog facade can be driven by a stub
/// in tests. Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(CatalogApi: Send)]
pub trait LocalCatalogApi {
    /// Executes `query` and returns the parsed JSON envelope.
    ///
    /// # Errors
    ///
    /// - `UpstreamUnavailable` when the transport fails.
    /// - `UpstreamError` when the catalog answers with a non-success status.
    /// - `MalformedResponse` when the body is not a JSON object.
    async fn fetch_json(&self, query: &BuiltQuery) -> Result<Value>;
}
