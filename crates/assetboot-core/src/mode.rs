//! Load mode resolution.
//!
//! The page URL may carry a `mode` query parameter (`?mode=local`) that
//! forces where libraries come from for the whole session:
//!
//! - `local` - always the copy hosted on the device
//! - `cdn` - always the public CDN when the asset has a CDN URL
//! - `auto` - probe the CDN once and decide (default)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Query parameter that selects the load mode.
pub const MODE_PARAM: &str = "mode";

/// Where libraries are loaded from for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Device-hosted copies only.
    Local,
    /// CDN for every asset that has a CDN URL.
    Cdn,
    /// Decide once with a reachability probe.
    #[default]
    Auto,
}

/// Error returned when parsing an unknown mode string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown load mode: {0:?} (expected local, cdn or auto)")]
pub struct ModeParseError(pub String);

impl LoadMode {
    /// All accepted modes.
    pub const ALL: [LoadMode; 3] = [LoadMode::Local, LoadMode::Cdn, LoadMode::Auto];

    /// Parse a mode, ignoring ASCII case. Surrounding whitespace is not
    /// stripped, so `" local"` is not a mode.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(value))
    }

    /// Lowercase name as used in the query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMode::Local => "local",
            LoadMode::Cdn => "cdn",
            LoadMode::Auto => "auto",
        }
    }

    /// Resolve the mode from a raw query string (without the leading `?`).
    ///
    /// Only the first `mode` parameter is considered. Unrecognized values
    /// fall back to [`LoadMode::Auto`].
    pub fn from_query(query: &str) -> Self {
        Self::from_query_or(query, LoadMode::Auto)
    }

    /// Like [`LoadMode::from_query`] but keeps `fallback` when the parameter
    /// is absent or invalid.
    pub fn from_query_or(query: &str, fallback: LoadMode) -> Self {
        url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .find(|(key, _)| key == MODE_PARAM)
            .and_then(|(_, value)| Self::parse(&value))
            .unwrap_or(fallback)
    }

    /// Resolve the mode from a page URL such as `http://silvia.local/?mode=cdn`.
    pub fn from_page_url(url: &Url, fallback: LoadMode) -> Self {
        url.query()
            .map(|query| Self::from_query_or(query, fallback))
            .unwrap_or(fallback)
    }

    /// Availability implied by a forced mode, `None` for `auto`.
    pub fn forced_availability(&self) -> Option<CdnAvailability> {
        match self {
            LoadMode::Local => Some(CdnAvailability::Unavailable),
            LoadMode::Cdn => Some(CdnAvailability::Available),
            LoadMode::Auto => None,
        }
    }

    /// Whether this mode requires a reachability probe.
    pub fn needs_probe(&self) -> bool {
        matches!(self, LoadMode::Auto)
    }
}

impl FromStr for LoadMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ModeParseError(s.to_string()))
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session-wide verdict on whether the CDN is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CdnAvailability {
    /// Not decided yet (auto mode before the probe).
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl CdnAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, CdnAvailability::Available)
    }
}

impl fmt::Display for CdnAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CdnAvailability::Unknown => "unknown",
            CdnAvailability::Available => "available",
            CdnAvailability::Unavailable => "unavailable",
        })
    }
}
