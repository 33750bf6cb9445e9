//! Loader errors.

use assetboot_core::AssetSource;
use thiserror::Error;

/// Errors reported by a [`ResourceFetcher`](crate::fetch::ResourceFetcher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The URL could not be resolved.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The background load task was torn down before it finished.
    #[error("load of {url} was aborted")]
    Aborted { url: String },
}

/// Errors that halt a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// A library element reported a load error.
    #[error("Failed: {url} ({asset} from {source_kind})")]
    Asset {
        asset: String,
        url: String,
        source_kind: AssetSource,
        #[source]
        cause: FetchError,
    },

    /// Importing the application module failed.
    #[error("application import failed: {0}")]
    AppImport(#[source] FetchError),

    /// `run` was called on a bootstrapper that already ran.
    #[error("bootstrap already started")]
    AlreadyStarted,
}

impl LoadError {
    /// Name of the asset that failed, `None` when no library failed.
    pub fn asset(&self) -> Option<&str> {
        match self {
            LoadError::Asset { asset, .. } => Some(asset),
            LoadError::AppImport(_) | LoadError::AlreadyStarted => None,
        }
    }
}
