//! Configuration loading and validation.
//!
//! Settings are merged from (lowest to highest precedence) built-in defaults,
//! a configuration file, and `NAB_`-prefixed environment variables, where
//! `__` separates nested keys (`NAB_RPC__HOST`). The file format is chosen
//! by extension: `.toml`, `.yaml`/`.yml` or `.json`.

pub mod error;
mod settings;

pub use crate::settings::{CacheSettings, RpcSettings, Settings};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "NAB_";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "nab")
}

/// Platform configuration file location, `<config_dir>/nab/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Platform cache file location, `<data_dir>/nab/cache.json`.
pub fn default_cache_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("cache.json"))
}
