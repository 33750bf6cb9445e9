//! # assetboot-loader
//!
//! Bootstrap loader for the web UI's third-party libraries, on tokio.
//!
//! This crate provides:
//! - [`ResourceFetcher`] and a `reqwest`-backed [`HttpFetcher`]
//! - The one-shot CDN reachability probe
//! - The heap gate used before each load
//! - The injector that attaches elements to the shared document
//! - The racing loader (local copy against CDN copy)
//! - Sequential and racing [`LoadStrategy`] implementations
//! - The [`Bootstrapper`] that drives the catalog and imports the app
//!
//! ## Usage
//!
//! ```rust,ignore
//! use assetboot_core::{LoaderSettings, SessionConfig};
//! use assetboot_loader::{Bootstrapper, HttpFetcher, ProcMeminfoSampler};
//!
//! let config = SessionConfig::resolve(LoaderSettings::default(), "http://silvia.local/?mode=auto")?;
//! let fetcher = HttpFetcher::new(config.page_url.clone())?;
//! let boot = Bootstrapper::from_config(config, Arc::new(fetcher), ProcMeminfoSampler::detect());
//! let mut ready = boot.ready_signal();
//! boot.run().await?;
//! ready.wait().await?;
//! ```

pub mod error;
pub mod fetch;
pub mod heap;
pub mod inject;
pub mod probe;
pub mod race;
pub mod sequencer;
pub mod session;
pub mod strategy;

#[cfg(test)]
mod mock;

pub use assetboot_core::{AssetCatalog, BootState, CdnAvailability, LoadMode, SessionConfig};
pub use error::{FetchError, LoadError};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::ResourceFetcher;
pub use heap::{FixedHeapSampler, HeapGate, HeapSampler, NoHeapIntrospection, ProcMeminfoSampler};
pub use inject::{new_document, Injector, LoadRequest, PendingLoad, SharedDocument};
pub use probe::probe_cdn;
pub use race::race_sources;
pub use sequencer::{BootFailed, BootReport, Bootstrapper, ReadySignal};
pub use session::Session;
pub use strategy::{strategy_for, LoadStrategy, RacingStrategy, SequentialStrategy};
