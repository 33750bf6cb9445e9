//! Loader settings and the immutable session configuration.
//!
//! Settings come from an optional JSON file with every field defaulted:
//!
//! ```json
//! {
//!   "mode": "auto",
//!   "strategy": "sequential",
//!   "probeUrl": "https://cdn.jsdelivr.net/npm/bootstrap@5.2.3/dist/css/bootstrap.min.css",
//!   "probeTimeoutMs": 500,
//!   "heap": { "minFreeBytes": 8000000, "checkIntervalMs": 100, "maxWaitMs": 2000 }
//! }
//! ```
//!
//! A [`SessionConfig`] is resolved once from the settings and the page URL
//! and is then shared read-only by every loader component.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::catalog::{AssetCatalog, CatalogError, DEFAULT_PROBE_URL};
use crate::heap::HeapGateSettings;
use crate::mode::LoadMode;

/// Errors that can occur while loading settings or resolving a session.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the settings file.
    #[error("Read error: {0}")]
    ReadError(#[from] std::io::Error),

    /// Settings data is invalid.
    #[error("Invalid data: {0}")]
    InvalidData(#[from] serde_json::Error),

    /// The page URL could not be parsed.
    #[error("Invalid page URL {url:?}: {source}")]
    InvalidPageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The page URL cannot serve as a base for relative asset paths.
    #[error("Page URL {0:?} cannot be used as a base URL")]
    NotABase(String),

    /// The configured catalog is inconsistent.
    #[error("Invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// Unknown strategy name.
    #[error("Unknown strategy {0:?} (expected sequential or racing)")]
    UnknownStrategy(String),
}

/// How each asset's source is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Probe the CDN once, then load assets one by one behind the heap gate.
    #[default]
    Sequential,
    /// Race the local copy against the CDN for every asset.
    Racing,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Sequential => "sequential",
            StrategyKind::Racing => "racing",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(StrategyKind::Sequential),
            "racing" => Ok(StrategyKind::Racing),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loader settings as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderSettings {
    /// Mode used when the page URL does not force one.
    pub mode: LoadMode,

    pub strategy: StrategyKind,

    /// CDN asset requested to decide availability in auto mode.
    pub probe_url: String,

    pub probe_timeout_ms: u64,

    pub heap: HeapGateSettings,

    /// Replaces the built-in library catalog when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<AssetCatalog>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            mode: LoadMode::Auto,
            strategy: StrategyKind::Sequential,
            probe_url: DEFAULT_PROBE_URL.to_string(),
            probe_timeout_ms: 500,
            heap: HeapGateSettings::default(),
            catalog: None,
        }
    }
}

impl LoaderSettings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Configuration of one bootstrap session.
///
/// Built once at startup; the mode never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Page URL; relative local paths resolve against it.
    pub page_url: Url,
    pub mode: LoadMode,
    pub strategy: StrategyKind,
    pub probe_url: String,
    pub probe_timeout: Duration,
    pub heap: HeapGateSettings,
    pub catalog: AssetCatalog,
}

impl SessionConfig {
    /// Merge settings with the page URL.
    ///
    /// A valid `mode` query parameter overrides the configured mode; an
    /// invalid one is ignored.
    pub fn resolve(settings: LoaderSettings, page_url: &str) -> Result<Self, ConfigError> {
        let page_url = Url::parse(page_url).map_err(|source| ConfigError::InvalidPageUrl {
            url: page_url.to_string(),
            source,
        })?;
        if page_url.cannot_be_a_base() {
            return Err(ConfigError::NotABase(page_url.to_string()));
        }

        let catalog = settings.catalog.unwrap_or_default();
        catalog.validate()?;

        Ok(Self {
            mode: LoadMode::from_page_url(&page_url, settings.mode),
            page_url,
            strategy: settings.strategy,
            probe_url: settings.probe_url,
            probe_timeout: Duration::from_millis(settings.probe_timeout_ms),
            heap: settings.heap,
            catalog,
        })
    }

    /// Resolve an asset path or URL against the page URL.
    ///
    /// Absolute URLs are returned unchanged.
    pub fn resolve_url(&self, path_or_url: &str) -> Result<Url, url::ParseError> {
        self.page_url.join(path_or_url)
    }
}
