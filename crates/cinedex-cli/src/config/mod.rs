//! `config.toml`: catalog defaults for the CLI.
//!
//! Holds the response language, cache lifetime, transport timeout and an
//! optional base URL override. The API token is read from
//! `TMDB_API_TOKEN` only and never written to disk.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, CatalogConfig};
pub use paths::resolve_config_path;
