//! Where `config.toml` lives.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// File name inside a config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "CINEDEX_CONFIG";

/// Resolves the config file path from the process environment.
///
/// Precedence: `--dir` (as `{dir}/config.toml`), then `CINEDEX_CONFIG`,
/// then `$XDG_CONFIG_HOME/cinedex/config.toml`, then
/// `~/.config/cinedex/config.toml`.
///
/// # Errors
///
/// Returns an error if none of `CINEDEX_CONFIG`, `XDG_CONFIG_HOME` and
/// `HOME` is set (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    config_path_from(dir.map(PathBuf::as_path), |name| std::env::var(name).ok())
}

/// Same as [`resolve_config_path`] with `env` standing in for the process
/// environment. Blank values count as unset.
fn config_path_from(dir: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(dir) = dir {
        return Ok(dir.join(CONFIG_FILE_NAME));
    }
    let var = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(file) = var(CONFIG_ENV) {
        return Ok(PathBuf::from(file));
    }
    let base = match (var("XDG_CONFIG_HOME"), var("HOME")) {
        (Some(xdg), _) => PathBuf::from(xdg),
        (None, Some(home)) => PathBuf::from(home).join(".config"),
        (None, None) => bail!("cannot locate config: set {CONFIG_ENV}, XDG_CONFIG_HOME or HOME"),
    };
    Ok(base.join("cinedex").join(CONFIG_FILE_NAME))
}
