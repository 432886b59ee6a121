//! `AppConfig` struct and TOML read/write.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use cinedex_api::cache::DEFAULT_CACHE_SECONDS;
use cinedex_api::query::DEFAULT_LANGUAGE;
use cinedex_api::upstream::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use url::Url;

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Catalog client settings.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Catalog client configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct CatalogConfig {
    /// Default response language.
    #[serde(default = "default_language")]
    pub language: String,
    /// Default cache lifetime in seconds.
    #[serde(default = "default_cache_seconds")]
    pub cache_seconds: u64,
    /// Transport timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// API base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            cache_seconds: default_cache_seconds(),
            timeout_seconds: default_timeout_seconds(),
            base_url: None,
        }
    }
}

fn default_language() -> String {
    String::from(DEFAULT_LANGUAGE)
}

const fn default_cache_seconds() -> u64 {
    DEFAULT_CACHE_SECONDS
}

const fn default_timeout_seconds() -> u64 {
    10
}

impl CatalogConfig {
    /// Transport timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Parsed base URL (configured or default).
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn base_url(&self) -> Result<Url> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Url::parse(raw).with_context(|| format!("invalid base_url {raw:?}"))
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}
