//! `CatalogError` - failure taxonomy shared by every catalog operation.

use thiserror::Error;

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors surfaced by the catalog core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum CatalogError {
    /// The caller built a request the catalog cannot serve (bad page,
    /// search combined with discover filters, bad id, ...).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The request never produced an HTTP response (connect error, timeout).
    #[error("catalog unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The remote catalog answered with a non-success status.
    #[error("catalog returned HTTP {status}: {body}")]
    UpstreamError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body is not the JSON envelope the endpoint promises.
    #[error("malformed catalog response: {0}")]
    MalformedResponse(String),
}

impl CatalogError {
    /// Builds an `InvalidQuery` error from any message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Returns `true` for errors the user can correct by changing input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidQuery(_))
    }

    /// Returns `true` for errors the presentation layer renders as an
    /// empty/fallback state rather than an input error.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        !self.is_user_error()
    }
}
