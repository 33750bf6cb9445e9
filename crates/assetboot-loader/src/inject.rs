//! Library injector.
//!
//! Each load attaches one element to the shared [`Document`], fetches the
//! resource in a background task and settles exactly once. The background
//! task records the element's final state even when nobody is waiting for
//! it any more.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use assetboot_core::{AssetKind, AssetSource, Document, ElementId, LoadOutcome};

use crate::error::{FetchError, LoadError};
use crate::fetch::ResourceFetcher;

/// The document shared by every load in a session.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Create an empty shared document.
pub fn new_document() -> SharedDocument {
    Arc::new(Mutex::new(Document::new()))
}

/// One element to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub asset: String,
    pub url: String,
    pub kind: AssetKind,
    pub source: AssetSource,
}

/// A started load.
pub struct PendingLoad {
    id: ElementId,
    request: LoadRequest,
    handle: JoinHandle<Result<Bytes, FetchError>>,
}

impl PendingLoad {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn request(&self) -> &LoadRequest {
        &self.request
    }

    pub fn source(&self) -> AssetSource {
        self.request.source
    }

    /// Wait for the terminal outcome.
    pub async fn finish(self) -> Result<Bytes, FetchError> {
        match self.handle.await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Aborted {
                url: self.request.url,
            }),
        }
    }

    /// Split into the element id, request and join handle, for callers that
    /// want to select over several loads.
    pub(crate) fn into_parts(
        self,
    ) -> (ElementId, LoadRequest, JoinHandle<Result<Bytes, FetchError>>) {
        (self.id, self.request, self.handle)
    }
}

/// Attaches elements to the document and drives their loads.
#[derive(Clone)]
pub struct Injector {
    fetcher: Arc<dyn ResourceFetcher>,
    document: SharedDocument,
}

impl Injector {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, document: SharedDocument) -> Self {
        Self { fetcher, document }
    }

    pub fn fetcher(&self) -> &Arc<dyn ResourceFetcher> {
        &self.fetcher
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// Attach a pending element and start loading it.
    pub async fn start(&self, request: LoadRequest) -> PendingLoad {
        let id = self.document.lock().await.attach(
            &request.asset,
            &request.url,
            request.kind,
            request.source,
        );
        trace!("attached element {} for {}", id, request.url);

        let fetch = self.fetcher.fetch(&request.url, request.kind);
        let document = self.document.clone();
        let handle = tokio::spawn(async move {
            let result = fetch.await;
            let mut document = document.lock().await;
            let attached = match &result {
                Ok(body) => document.mark_loaded(id, body.len()),
                Err(_) => document.mark_failed(id),
            };
            if !attached {
                trace!("element {} settled after being detached", id);
            }
            result
        });

        PendingLoad {
            id,
            request,
            handle,
        }
    }

    /// Load one element to completion.
    ///
    /// On success the optional global is bound before this returns. No
    /// retries are attempted.
    pub async fn inject(
        &self,
        request: LoadRequest,
        global: Option<&str>,
    ) -> Result<LoadOutcome, LoadError> {
        let pending = self.start(request).await;
        let id = pending.id();
        let request = pending.request().clone();

        match pending.finish().await {
            Ok(_) => {
                self.complete(id, &request, global).await;
                Ok(outcome_of(&request))
            }
            Err(cause) => Err(asset_error(&request, cause)),
        }
    }

    /// Bind the global for a successfully loaded element.
    pub(crate) async fn complete(&self, id: ElementId, request: &LoadRequest, global: Option<&str>) {
        let Some(name) = global else {
            return;
        };
        if !request.kind.supports_global() {
            return;
        }
        if self.document.lock().await.bind_global(name, id) {
            debug!("bound global {} to {}", name, request.url);
        }
    }

    /// Detach an element if it has not loaded yet.
    ///
    /// Returns `true` if the element was removed.
    pub(crate) async fn retract_if_pending(&self, id: ElementId) -> bool {
        let mut document = self.document.lock().await;
        let pending = document
            .element(id)
            .map(|e| e.state == assetboot_core::ElementState::Pending)
            .unwrap_or(false);
        if pending {
            document.detach(id);
        }
        pending
    }
}

pub(crate) fn outcome_of(request: &LoadRequest) -> LoadOutcome {
    LoadOutcome {
        asset: request.asset.clone(),
        source: request.source,
        url: request.url.clone(),
    }
}

pub(crate) fn asset_error(request: &LoadRequest, cause: FetchError) -> LoadError {
    LoadError::Asset {
        asset: request.asset.clone(),
        url: request.url.clone(),
        source_kind: request.source,
        cause,
    }
}
