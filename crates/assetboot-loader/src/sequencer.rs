//! Bootstrap sequencer.
//!
//! Drives the catalog in declared order, one asset at a time, then imports
//! the application module:
//!
//! ```text
//! idle -> probing (auto only) -> loading[0..n] -> importing-app -> ready
//!                                      \                \-> failed
//!                                       \-> failed
//! ```
//!
//! The chain stops at the first failure. Failures are logged and returned,
//! never retried. A bootstrapper runs once; later calls to `run` are
//! rejected without touching the document.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

use assetboot_core::{
    AssetKind, AssetSource, BootState, CdnAvailability, LoadOutcome, SessionConfig,
};

use crate::error::LoadError;
use crate::fetch::ResourceFetcher;
use crate::heap::HeapSampler;
use crate::inject::{new_document, Injector, LoadRequest, SharedDocument};
use crate::session::Session;
use crate::strategy::{strategy_for, LoadStrategy};

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootReport {
    pub availability: CdnAvailability,
    /// One outcome per catalog entry, in load order.
    pub libraries: Vec<LoadOutcome>,
    pub app: LoadOutcome,
}

/// Error returned by [`ReadySignal::wait`] when the run failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bootstrap failed: {0}")]
pub struct BootFailed(pub String);

/// Completion signal the application waits on.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    rx: watch::Receiver<BootState>,
}

impl ReadySignal {
    /// Current state of the run.
    pub fn state(&self) -> BootState {
        self.rx.borrow().clone()
    }

    /// Wait until the run reaches a terminal state.
    pub async fn wait(&mut self) -> Result<(), BootFailed> {
        let state = self
            .rx
            .wait_for(BootState::is_terminal)
            .await
            .map(|state| state.clone())
            .map_err(|_| BootFailed("bootstrapper dropped before finishing".to_string()))?;
        match state {
            BootState::Ready => Ok(()),
            BootState::Failed { reason } => Err(BootFailed(reason)),
            other => Err(BootFailed(format!("unexpected state {:?}", other))),
        }
    }
}

/// Runs one bootstrap sequence.
pub struct Bootstrapper {
    session: Arc<Session>,
    injector: Injector,
    strategy: Box<dyn LoadStrategy>,
    state: watch::Sender<BootState>,
    started: AtomicBool,
}

impl Bootstrapper {
    pub fn new(
        session: Arc<Session>,
        injector: Injector,
        strategy: Box<dyn LoadStrategy>,
    ) -> Self {
        let (state, _) = watch::channel(BootState::Idle);
        Self {
            session,
            injector,
            strategy,
            state,
            started: AtomicBool::new(false),
        }
    }

    /// Wire up a bootstrapper from configuration, using the strategy the
    /// configuration selects and a fresh document.
    pub fn from_config(
        config: SessionConfig,
        fetcher: Arc<dyn ResourceFetcher>,
        sampler: Arc<dyn HeapSampler>,
    ) -> Self {
        let session = Arc::new(Session::new(config));
        let strategy = strategy_for(session.config().strategy, &session, sampler);
        let injector = Injector::new(fetcher, new_document());
        Self::new(session, injector, strategy)
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn document(&self) -> &SharedDocument {
        self.injector.document()
    }

    pub fn strategy(&self) -> &dyn LoadStrategy {
        self.strategy.as_ref()
    }

    /// Subscribe to state changes. Can be called before or after `run`.
    pub fn ready_signal(&self) -> ReadySignal {
        ReadySignal {
            rx: self.state.subscribe(),
        }
    }

    pub fn state(&self) -> BootState {
        self.state.borrow().clone()
    }

    fn transition(&self, next: BootState) {
        self.state.send_if_modified(|current| {
            if current.can_transition_to(&next) {
                *current = next;
                true
            } else {
                warn!("ignoring boot state change {:?} -> {:?}", current, next);
                false
            }
        });
    }

    fn fail(&self, err: LoadError) -> LoadError {
        error!("Error loading JS libraries: {}", err);
        self.transition(BootState::Failed {
            reason: err.to_string(),
        });
        err
    }

    /// Run the sequence to completion.
    ///
    /// Only the first call runs; any later call returns
    /// [`LoadError::AlreadyStarted`].
    pub async fn run(&self) -> Result<BootReport, LoadError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(LoadError::AlreadyStarted);
        }

        let session = self.session.as_ref();
        let catalog = &session.config().catalog;

        if self.strategy.needs_probe(session) {
            self.transition(BootState::Probing);
        }
        self.strategy.prepare(session, &self.injector).await;

        let mut libraries = Vec::with_capacity(catalog.len());
        for (index, asset) in catalog.iter().enumerate() {
            self.transition(BootState::Loading {
                index,
                asset: asset.name.clone(),
            });
            self.strategy.admit().await;

            match self.strategy.load(session, &self.injector, asset).await {
                Ok(outcome) => {
                    info!("{} loaded from {}", asset.name, outcome.source);
                    libraries.push(outcome);
                }
                Err(err) => return Err(self.fail(err)),
            }
        }

        self.transition(BootState::ImportingApp);
        self.strategy.admit().await;
        let app = self
            .injector
            .inject(
                LoadRequest {
                    asset: "app".to_string(),
                    url: catalog.app.path.clone(),
                    kind: AssetKind::Module,
                    source: AssetSource::Local,
                },
                None,
            )
            .await
            .map_err(|err| match err {
                LoadError::Asset { cause, .. } => LoadError::AppImport(cause),
                other => other,
            });

        match app {
            Ok(app) => {
                info!("App loaded");
                self.transition(BootState::Ready);
                Ok(BootReport {
                    availability: session.availability(),
                    libraries,
                    app,
                })
            }
            Err(err) => Err(self.fail(err)),
        }
    }
}
