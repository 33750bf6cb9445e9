//! Local-versus-CDN racing loader.
//!
//! Both copies of an asset are requested at once and the first to settle
//! decides the outcome, with one asymmetry: the local copy is the fallback,
//! so its failure always fails the asset, while a CDN failure is swallowed.
//! Losing requests are never cancelled; they run to completion in the
//! background and their outcome is ignored.

use bytes::Bytes;
use futures::future::{self, Either};
use tokio::task::JoinError;
use tracing::debug;

use assetboot_core::{AssetDescriptor, AssetSource, LoadOutcome};

use crate::error::{FetchError, LoadError};
use crate::inject::{asset_error, outcome_of, Injector, LoadRequest};

fn request_for(asset: &AssetDescriptor, source: AssetSource) -> LoadRequest {
    LoadRequest {
        asset: asset.name.clone(),
        url: asset.url_for(source).to_string(),
        kind: asset.kind,
        source,
    }
}

fn settled(
    joined: Result<Result<Bytes, FetchError>, JoinError>,
    request: &LoadRequest,
) -> Result<Bytes, FetchError> {
    joined.unwrap_or_else(|_| {
        Err(FetchError::Aborted {
            url: request.url.clone(),
        })
    })
}

/// Load `asset` by racing its local copy against its CDN copy.
///
/// | first to settle | result                                       |
/// |-----------------|----------------------------------------------|
/// | local ok        | local wins, CDN keeps running unobserved     |
/// | local error     | asset fails, even with CDN outstanding       |
/// | CDN ok          | CDN wins, pending local element is detached  |
/// | CDN error       | ignored, result is whatever local produces   |
///
/// Without a CDN URL this is a plain local load.
pub async fn race_sources(
    injector: &Injector,
    asset: &AssetDescriptor,
) -> Result<LoadOutcome, LoadError> {
    let global = asset.effective_global();
    let local_request = request_for(asset, AssetSource::Local);

    if asset.cdn_url.is_none() {
        return injector.inject(local_request, global).await;
    }
    let cdn_request = request_for(asset, AssetSource::Cdn);

    let (local_id, local_request, local_handle) =
        injector.start(local_request).await.into_parts();
    let (cdn_id, cdn_request, cdn_handle) = injector.start(cdn_request).await.into_parts();

    match future::select(local_handle, cdn_handle).await {
        Either::Left((local, _cdn)) => match settled(local, &local_request) {
            Ok(_) => {
                injector.complete(local_id, &local_request, global).await;
                Ok(outcome_of(&local_request))
            }
            Err(cause) => Err(asset_error(&local_request, cause)),
        },
        Either::Right((cdn, local_handle)) => match settled(cdn, &cdn_request) {
            Ok(_) => {
                if injector.retract_if_pending(local_id).await {
                    debug!("{}: CDN won, detached pending local element", asset.name);
                }
                injector.complete(cdn_id, &cdn_request, global).await;
                Ok(outcome_of(&cdn_request))
            }
            Err(cause) => {
                debug!("{}: CDN copy failed ({}), waiting for local", asset.name, cause);
                match settled(local_handle.await, &local_request) {
                    Ok(_) => {
                        injector.complete(local_id, &local_request, global).await;
                        Ok(outcome_of(&local_request))
                    }
                    Err(cause) => Err(asset_error(&local_request, cause)),
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use assetboot_core::ElementState;

    use crate::inject::new_document;
    use crate::mock::ScriptedFetcher;

    const LOCAL: &str = "/js/uPlot.1.6.28.min.js";
    const CDN: &str = "https://cdn.example/uplot.iife.min.js";

    fn uplot() -> AssetDescriptor {
        AssetDescriptor::script("uPlot", LOCAL, CDN).with_global("uPlot")
    }

    fn injector(fetcher: &ScriptedFetcher) -> Injector {
        Injector::new(Arc::new(fetcher.clone()), new_document())
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_sources_requested_at_once() {
        let fetcher = ScriptedFetcher::new().ok(LOCAL, 50).ok(CDN, 80);
        let injector = injector(&fetcher);

        race_sources(&injector, &uplot()).await.unwrap();
        assert_eq!(fetcher.started(), vec![LOCAL.to_string(), CDN.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cdn_wins_and_local_is_detached() {
        let fetcher = ScriptedFetcher::new().ok(LOCAL, 300).ok(CDN, 40);
        let injector = injector(&fetcher);

        let outcome = race_sources(&injector, &uplot()).await.unwrap();
        assert_eq!(outcome.source, AssetSource::Cdn);
        assert_eq!(outcome.url, CDN);

        {
            let doc = injector.document().lock().await;
            assert_eq!(doc.elements().len(), 1);
            assert_eq!(doc.elements()[0].url, CDN);
            assert_eq!(doc.global("uPlot").unwrap().source, AssetSource::Cdn);
        }

        // The local request still completes in the background without
        // reattaching anything.
        tokio::time::sleep(Duration::from_millis(500)).await;
        let doc = injector.document().lock().await;
        assert_eq!(doc.elements().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cdn_success_before_local_error_resolves_via_cdn() {
        let fetcher = ScriptedFetcher::new().fail(LOCAL, 200).ok(CDN, 20);
        let injector = injector(&fetcher);

        let outcome = race_sources(&injector, &uplot()).await.unwrap();
        assert_eq!(outcome.source, AssetSource::Cdn);

        tokio::time::sleep(Duration::from_millis(300)).await;
        let doc = injector.document().lock().await;
        assert!(doc.elements().iter().all(|e| e.source == AssetSource::Cdn));
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_wins_and_late_cdn_failure_is_ignored() {
        let fetcher = ScriptedFetcher::new().ok(LOCAL, 10).fail(CDN, 400);
        let injector = injector(&fetcher);

        let outcome = race_sources(&injector, &uplot()).await.unwrap();
        assert_eq!(outcome.source, AssetSource::Local);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let doc = injector.document().lock().await;
        assert_eq!(doc.global("uPlot").unwrap().source, AssetSource::Local);
        // The CDN element stays attached and records its own failure
        let cdn = doc.elements().iter().find(|e| e.url == CDN).unwrap();
        assert_eq!(cdn.state, ElementState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_failure_first_rejects_even_with_cdn_outstanding() {
        let fetcher = ScriptedFetcher::new().fail(LOCAL, 10).ok(CDN, 100);
        let injector = injector(&fetcher);

        let err = race_sources(&injector, &uplot()).await.unwrap_err();
        match err {
            LoadError::Asset {
                url, source_kind, ..
            } => {
                assert_eq!(url, LOCAL);
                assert_eq!(source_kind, AssetSource::Local);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cdn_failure_first_falls_back_to_local() {
        let fetcher = ScriptedFetcher::new().ok(LOCAL, 100).fail(CDN, 10);
        let injector = injector(&fetcher);

        let outcome = race_sources(&injector, &uplot()).await.unwrap();
        assert_eq!(outcome.source, AssetSource::Local);
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_fail_reports_local_error() {
        let fetcher = ScriptedFetcher::new().fail(LOCAL, 100).fail(CDN, 10);
        let injector = injector(&fetcher);

        let err = race_sources(&injector, &uplot()).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Asset {
                source_kind: AssetSource::Local,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_failure_without_cdn_rejects() {
        let fetcher = ScriptedFetcher::new().fail(LOCAL, 10);
        let injector = injector(&fetcher);

        let err = race_sources(&injector, &uplot().local_only()).await.unwrap_err();
        assert_eq!(err.asset(), Some("uPlot"));
        assert_eq!(fetcher.started(), vec![LOCAL.to_string()]);
    }
}
