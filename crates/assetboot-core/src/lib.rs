//! # assetboot-core
//!
//! Core model for the web UI's bootstrap asset loader.
//!
//! This crate provides:
//! - Load modes and the `mode` query parameter resolver
//! - Asset descriptors, the default library catalog and source selection
//! - The document model that loaded elements are attached to
//! - The boot state machine
//! - Loader settings and the immutable session configuration
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! so the same model can drive a native loader or a browser-side one.

pub mod asset;
pub mod catalog;
pub mod config;
pub mod document;
pub mod heap;
pub mod mode;
pub mod state;

pub use asset::{select_source, AssetDescriptor, AssetKind, AssetSource, LoadOutcome};
pub use catalog::{AppModule, AssetCatalog, CatalogError, DEFAULT_PROBE_URL};
pub use config::{ConfigError, LoaderSettings, SessionConfig, StrategyKind};
pub use document::{Document, Element, ElementId, ElementState};
pub use heap::{GateOutcome, HeapGateSettings, HeapSample};
pub use mode::{CdnAvailability, LoadMode, ModeParseError, MODE_PARAM};
pub use state::BootState;
