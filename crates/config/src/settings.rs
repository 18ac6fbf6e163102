use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::error::Kind;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::{ENV_PREFIX, default_cache_path, default_config_path};

/// Everything a run needs to know before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Address of the RSS feed to follow.
    pub feed: String,
    /// Download root; each series gets its own directory below it.
    pub download: PathBuf,
    #[serde(default)]
    pub cache: CacheSettings,
    pub rpc: RpcSettings,
    /// Substrings of a release's descriptor text that mark it as a
    /// corrected re-issue. Case-sensitive.
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
    /// Feed request timeout, in seconds.
    #[serde(default = "default_timeout")]
    pub feed_timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Identifier cache file; see [`Settings::cache_path`].
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Maximum number of identifiers remembered.
    #[serde(default = "default_cache_size")]
    pub size: usize,
}
impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: None,
            size: default_cache_size(),
        }
    }
}

/// Connection parameters for the Transmission RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RpcSettings {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default = "default_rpc_path")]
    pub path: String,
    #[serde(default)]
    pub tls: bool,
    /// Request timeout, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}
impl RpcSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn default_markers() -> Vec<String> {
    vec!["REPACK".to_string(), "PROPER".to_string()]
}
fn default_timeout() -> u64 {
    30
}
fn default_cache_size() -> usize {
    1000
}
fn default_port() -> u16 {
    9091
}
fn default_rpc_path() -> String {
    "/transmission/rpc".to_string()
}

impl Settings {
    /// Load and validate settings.
    ///
    /// An explicit `path` must exist. Without one, the platform default
    /// location is used if a file is there, otherwise only the environment
    /// is consulted.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                if let Some(default) = default_config_path().filter(|default| default.is_file()) {
                    figment = merge_file(figment, &default)?;
                } else {
                    tracing::debug!("No configuration file found, using environment only");
                }
            },
        }
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let settings: Self = match figment.extract() {
            Ok(settings) => settings,
            Err(err) => {
                let kind = match &err.kind {
                    Kind::MissingField(field) => {
                        let mut path = err.path.clone();
                        path.push(field.to_string());
                        ErrorKind::MissingField(path.join("."))
                    },
                    _ => ErrorKind::Load,
                };
                return Err(err).or_raise(|| kind);
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would make a run unsafe or pointless.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field, reason| Err(exn::Exn::from(ErrorKind::Invalid { field, reason }));
        if self.feed.trim().is_empty() {
            return invalid("feed", "must not be empty");
        }
        if !self.download.is_absolute() {
            return invalid("download", "must be an absolute path");
        }
        if self.cache.size == 0 {
            return invalid("cache.size", "must be greater than zero");
        }
        if self.rpc.host.trim().is_empty() {
            return invalid("rpc.host", "must not be empty");
        }
        if self.markers.is_empty() {
            return invalid("markers", "must contain at least one marker");
        }
        if self.markers.iter().any(|marker| marker.trim().is_empty()) {
            return invalid("markers", "must not contain blank markers");
        }
        Ok(())
    }

    /// Identifier cache file, falling back to `<data_dir>/nab/cache.json`.
    pub fn cache_path(&self) -> Result<PathBuf> {
        self.cache
            .path
            .clone()
            .or_else(default_cache_path)
            .ok_or_raise(|| ErrorKind::MissingField("cache.path".to_string()))
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
