//! Asset source selection strategies.
//!
//! Two ways of deciding where each library comes from:
//!
//! - [`SequentialStrategy`] (default): probe the CDN once, then load every
//!   asset from the chosen source behind the heap gate.
//! - [`RacingStrategy`]: no probe and no gate; every asset races its local
//!   copy against its CDN copy.
//!
//! The sequencer drives either through [`LoadStrategy`].

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::debug;

use assetboot_core::{AssetDescriptor, LoadMode, LoadOutcome, StrategyKind};

use crate::error::LoadError;
use crate::heap::{HeapGate, HeapSampler};
use crate::inject::{Injector, LoadRequest};
use crate::race::race_sources;
use crate::session::Session;

/// How assets are admitted and loaded.
pub trait LoadStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Whether [`LoadStrategy::prepare`] will probe the CDN for this session.
    fn needs_probe(&self, session: &Session) -> bool;

    /// Runs once before the first asset.
    fn prepare<'a>(&'a self, session: &'a Session, injector: &'a Injector) -> BoxFuture<'a, ()>;

    /// Runs before every asset and before the application import.
    fn admit(&self) -> BoxFuture<'_, ()>;

    /// Load one asset.
    fn load<'a>(
        &'a self,
        session: &'a Session,
        injector: &'a Injector,
        asset: &'a AssetDescriptor,
    ) -> BoxFuture<'a, Result<LoadOutcome, LoadError>>;
}

/// Load the asset from the session's selected source.
async fn load_selected(
    session: &Session,
    injector: &Injector,
    asset: &AssetDescriptor,
) -> Result<LoadOutcome, LoadError> {
    let source = session.select_source(asset);
    let request = LoadRequest {
        asset: asset.name.clone(),
        url: asset.url_for(source).to_string(),
        kind: asset.kind,
        source,
    };
    injector.inject(request, asset.effective_global()).await
}

/// Decide once, apply everywhere.
pub struct SequentialStrategy {
    gate: HeapGate,
}

impl SequentialStrategy {
    pub fn new(gate: HeapGate) -> Self {
        Self { gate }
    }
}

impl LoadStrategy for SequentialStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sequential
    }

    fn needs_probe(&self, session: &Session) -> bool {
        session.mode().needs_probe()
    }

    fn prepare<'a>(&'a self, session: &'a Session, injector: &'a Injector) -> BoxFuture<'a, ()> {
        async move {
            if self.needs_probe(session) {
                session
                    .resolve_availability(injector.fetcher().as_ref())
                    .await;
            } else {
                debug!(
                    "asset loader forced to {}, skipping CDN probe",
                    session.mode()
                );
            }
        }
        .boxed()
    }

    fn admit(&self) -> BoxFuture<'_, ()> {
        async move {
            let outcome = self.gate.wait().await;
            debug!("heap gate: {:?}", outcome);
        }
        .boxed()
    }

    fn load<'a>(
        &'a self,
        session: &'a Session,
        injector: &'a Injector,
        asset: &'a AssetDescriptor,
    ) -> BoxFuture<'a, Result<LoadOutcome, LoadError>> {
        load_selected(session, injector, asset).boxed()
    }
}

/// Race every time.
#[derive(Debug, Default)]
pub struct RacingStrategy;

impl LoadStrategy for RacingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Racing
    }

    fn needs_probe(&self, _session: &Session) -> bool {
        false
    }

    fn prepare<'a>(&'a self, _session: &'a Session, _injector: &'a Injector) -> BoxFuture<'a, ()> {
        future::ready(()).boxed()
    }

    fn admit(&self) -> BoxFuture<'_, ()> {
        future::ready(()).boxed()
    }

    fn load<'a>(
        &'a self,
        session: &'a Session,
        injector: &'a Injector,
        asset: &'a AssetDescriptor,
    ) -> BoxFuture<'a, Result<LoadOutcome, LoadError>> {
        match session.mode() {
            // Forced modes have nothing to race
            LoadMode::Local | LoadMode::Cdn => load_selected(session, injector, asset).boxed(),
            LoadMode::Auto => race_sources(injector, asset).boxed(),
        }
    }
}

/// Build the strategy selected by configuration.
pub fn strategy_for(
    kind: StrategyKind,
    session: &Session,
    sampler: Arc<dyn HeapSampler>,
) -> Box<dyn LoadStrategy> {
    match kind {
        StrategyKind::Sequential => Box::new(SequentialStrategy::new(HeapGate::new(
            session.config().heap,
            sampler,
        ))),
        StrategyKind::Racing => Box::new(RacingStrategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{FixedHeapSampler, NoHeapIntrospection};
    use crate::inject::new_document;
    use crate::mock::ScriptedFetcher;
    use assetboot_core::{AssetSource, LoaderSettings, SessionConfig};

    const LOCAL: &str = "/js/vue.js";
    const CDN: &str = "https://cdn.example/vue.js";

    fn vue() -> AssetDescriptor {
        AssetDescriptor::script("Vue", LOCAL, CDN).with_global("Vue")
    }

    fn session(page: &str) -> Session {
        Session::new(SessionConfig::resolve(LoaderSettings::default(), page).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_racing_local_mode_never_requests_cdn() {
        let fetcher = ScriptedFetcher::new().ok(LOCAL, 50).ok(CDN, 1);
        let injector = Injector::new(Arc::new(fetcher.clone()), new_document());
        let session = session("http://silvia.local/?mode=local");

        let outcome = RacingStrategy.load(&session, &injector, &vue()).await.unwrap();
        assert_eq!(outcome.source, AssetSource::Local);
        assert_eq!(fetcher.started(), vec![LOCAL.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_racing_auto_mode_requests_both() {
        let fetcher = ScriptedFetcher::new().ok(LOCAL, 50).ok(CDN, 1);
        let injector = Injector::new(Arc::new(fetcher.clone()), new_document());
        let session = session("http://silvia.local/");

        RacingStrategy.prepare(&session, &injector).await;
        let outcome = RacingStrategy.load(&session, &injector, &vue()).await.unwrap();
        assert_eq!(outcome.source, AssetSource::Cdn);
        assert_eq!(fetcher.started().len(), 2);
        assert!(fetcher.heads().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_cdn_mode_never_requests_local() {
        let fetcher = ScriptedFetcher::new().ok(LOCAL, 1).ok(CDN, 1);
        let injector = Injector::new(Arc::new(fetcher.clone()), new_document());
        let session = session("http://silvia.local/?mode=cdn");
        let strategy = SequentialStrategy::new(HeapGate::new(
            Default::default(),
            Arc::new(NoHeapIntrospection),
        ));

        strategy.prepare(&session, &injector).await;
        let outcome = strategy.load(&session, &injector, &vue()).await.unwrap();
        assert_eq!(outcome.source, AssetSource::Cdn);
        assert_eq!(fetcher.started(), vec![CDN.to_string()]);
        assert!(fetcher.heads().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_strategy_for_kind() {
        let session = session("http://silvia.local/");
        let sampler: Arc<dyn HeapSampler> = Arc::new(FixedHeapSampler(u64::MAX));
        assert_eq!(
            strategy_for(StrategyKind::Sequential, &session, sampler.clone()).kind(),
            StrategyKind::Sequential
        );
        let racing = strategy_for(StrategyKind::Racing, &session, sampler);
        assert_eq!(racing.kind(), StrategyKind::Racing);
        assert!(!racing.needs_probe(&session));
    }
}
