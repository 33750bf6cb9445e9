//! # assetboot-host
//!
//! Static asset host with the same layout as the espresso controller's
//! embedded web server.
//!
//! The device serves its flash filesystem like this:
//!
//! - `/css/`, `/js/`, `/img/`, `/webfonts/` - library and UI assets
//! - `/manifest.json` - web app manifest
//! - `/` - pages from `html/`, with `index.html` as default file
//!
//! Every response carries `Cache-Control: no-cache`. The host also keeps
//! request statistics, exposed at `GET /hostStats`, so tests can tell which
//! origin served which asset.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use assetboot_host::{create_router, HostState};
//!
//! let state = HostState::new("./data");
//! let app = create_router(state.into_shared());
//!
//! let listener = TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod routes;
pub mod statistics;

// Re-exports
pub use routes::create_router;
pub use statistics::{HostStatistics, StatisticsCollector};

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

/// Errors raised while starting a host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("asset root {0:?} is not a directory")]
    MissingRoot(PathBuf),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared state for all route handlers.
pub struct HostState {
    /// Root of the asset tree (`css/`, `js/`, `html/`, ...).
    root: PathBuf,
    stats: StatisticsCollector,
}

impl HostState {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stats: StatisticsCollector::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> &StatisticsCollector {
        &self.stats
    }

    pub fn into_shared(self) -> AppState {
        Arc::new(self)
    }
}

/// Type alias for shared state in Axum handlers.
pub type AppState = Arc<HostState>;

/// Bind `addr` and serve the asset tree until the future is dropped.
///
/// Returns the bound address (useful with port 0) and the serving future.
pub async fn bind(
    addr: SocketAddr,
    state: AppState,
) -> Result<(SocketAddr, impl std::future::Future<Output = Result<(), HostError>>), HostError> {
    if !state.root().is_dir() {
        return Err(HostError::MissingRoot(state.root().to_path_buf()));
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| HostError::Bind { addr, source })?;
    let local = listener.local_addr()?;
    info!("Asset host serving {:?} on {}", state.root(), local);

    let app = create_router(state);
    let serve = async move {
        axum::serve(listener, app).await?;
        Ok(())
    };
    Ok((local, serve))
}
