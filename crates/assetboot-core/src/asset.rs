//! Asset descriptors and source selection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mode::{CdnAvailability, LoadMode};

/// Kind of loadable element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// `<link rel="stylesheet">`
    Stylesheet,
    /// Deferred classic `<script>`.
    Script,
    /// The application entry module.
    Module,
}

impl AssetKind {
    /// Whether a global binding may be attached to this kind.
    pub fn supports_global(&self) -> bool {
        matches!(self, AssetKind::Script)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssetKind::Stylesheet => "css",
            AssetKind::Script => "js",
            AssetKind::Module => "module",
        })
    }
}

/// Origin an asset was (or will be) loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSource {
    Local,
    Cdn,
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssetSource::Local => "local",
            AssetSource::Cdn => "cdn",
        })
    }
}

/// One library in the bootstrap sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    /// Human readable name used in logs ("Bootstrap CSS").
    pub name: String,

    /// Path on the device, resolved against the page origin.
    pub local_path: String,

    /// Absolute CDN URL, if the library is published on one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn_url: Option<String>,

    pub kind: AssetKind,

    /// Global name the loaded script is bound to once it loads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<String>,
}

impl AssetDescriptor {
    /// Stylesheet with a local copy and a CDN mirror.
    pub fn stylesheet(name: &str, local_path: &str, cdn_url: &str) -> Self {
        Self {
            name: name.to_string(),
            local_path: local_path.to_string(),
            cdn_url: Some(cdn_url.to_string()),
            kind: AssetKind::Stylesheet,
            global: None,
        }
    }

    /// Script with a local copy and a CDN mirror.
    pub fn script(name: &str, local_path: &str, cdn_url: &str) -> Self {
        Self {
            kind: AssetKind::Script,
            ..Self::stylesheet(name, local_path, cdn_url)
        }
    }

    /// Bind the loaded script to a global name.
    pub fn with_global(mut self, global: &str) -> Self {
        self.global = Some(global.to_string());
        self
    }

    /// Drop the CDN mirror.
    pub fn local_only(mut self) -> Self {
        self.cdn_url = None;
        self
    }

    /// URL to request for the given source. Falls back to the local path
    /// when no CDN URL exists.
    pub fn url_for(&self, source: AssetSource) -> &str {
        match (source, self.cdn_url.as_deref()) {
            (AssetSource::Cdn, Some(cdn)) => cdn,
            _ => &self.local_path,
        }
    }

    /// Global binding that applies to this asset, if any.
    pub fn effective_global(&self) -> Option<&str> {
        if self.kind.supports_global() {
            self.global.as_deref()
        } else {
            None
        }
    }
}

/// Pick the source for an asset.
///
/// The CDN is used only when it is forced or known available **and** the
/// asset has a CDN URL. Everything else loads locally.
pub fn select_source(
    mode: LoadMode,
    availability: CdnAvailability,
    asset: &AssetDescriptor,
) -> AssetSource {
    if asset.cdn_url.is_none() {
        return AssetSource::Local;
    }
    match mode {
        LoadMode::Local => AssetSource::Local,
        LoadMode::Cdn => AssetSource::Cdn,
        LoadMode::Auto if availability.is_available() => AssetSource::Cdn,
        LoadMode::Auto => AssetSource::Local,
    }
}

/// Result of a completed load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOutcome {
    pub asset: String,
    pub source: AssetSource,
    pub url: String,
}
