//! Per-page-load session state.

use tokio::sync::OnceCell;

use assetboot_core::{
    select_source, AssetDescriptor, AssetSource, CdnAvailability, LoadMode, SessionConfig,
};

use crate::fetch::ResourceFetcher;
use crate::probe::probe_cdn;

/// Immutable session configuration plus the CDN verdict.
///
/// The verdict is fixed at construction for forced modes and decided at
/// most once by the probe in auto mode; it never changes afterwards.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    availability: OnceCell<CdnAvailability>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let availability = OnceCell::new_with(config.mode.forced_availability());
        Self {
            config,
            availability,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> LoadMode {
        self.config.mode
    }

    /// Current verdict, `Unknown` until the probe has run.
    pub fn availability(&self) -> CdnAvailability {
        self.availability.get().copied().unwrap_or_default()
    }

    /// Run the probe if the verdict is still open and return the verdict.
    ///
    /// Concurrent and repeated calls share the first probe's result.
    pub async fn resolve_availability<F>(&self, fetcher: &F) -> CdnAvailability
    where
        F: ResourceFetcher + ?Sized,
    {
        *self
            .availability
            .get_or_init(|| probe_cdn(fetcher, &self.config.probe_url, self.config.probe_timeout))
            .await
    }

    /// Source for `asset` under this session's mode and verdict.
    pub fn select_source(&self, asset: &AssetDescriptor) -> AssetSource {
        select_source(self.config.mode, self.availability(), asset)
    }
}
