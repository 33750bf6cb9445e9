//! Scripted in-memory fetcher for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::future::{self, BoxFuture, FutureExt};

use assetboot_core::AssetKind;

use crate::error::FetchError;
use crate::fetch::ResourceFetcher;

#[derive(Debug, Clone, Copy)]
enum Reply {
    Ok(Duration),
    Fail(Duration),
    Hang,
}

/// Request lifecycle event, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Head(String),
    Start(String),
    Settle(String),
}

/// Fetcher whose replies are scripted per URL.
///
/// Unscripted URLs answer 404 immediately.
#[derive(Clone, Default)]
pub(crate) struct ScriptedFetcher {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Succeed after `delay_ms`.
    pub(crate) fn ok(self, url: &str, delay_ms: u64) -> Self {
        self.script(url, Reply::Ok(Duration::from_millis(delay_ms)))
    }

    /// Fail after `delay_ms`.
    pub(crate) fn fail(self, url: &str, delay_ms: u64) -> Self {
        self.script(url, Reply::Fail(Duration::from_millis(delay_ms)))
    }

    /// Never answer.
    pub(crate) fn hang(self, url: &str) -> Self {
        self.script(url, Reply::Hang)
    }

    fn script(self, url: &str, reply: Reply) -> Self {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
        self
    }

    fn reply_for(&self, url: &str) -> Option<Reply> {
        self.replies.lock().unwrap().get(url).copied()
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// URLs fetched with GET, in the order the loads were started.
    pub(crate) fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Start(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    /// URLs checked with HEAD.
    pub(crate) fn heads(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Head(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl ResourceFetcher for ScriptedFetcher {
    fn head(&self, url: &str) -> BoxFuture<'static, Result<(), FetchError>> {
        self.record(Event::Head(url.to_string()));
        let reply = self.reply_for(url);
        let url = url.to_string();
        async move {
            match reply {
                // Any response counts, including a failing one
                Some(Reply::Ok(delay)) | Some(Reply::Fail(delay)) => {
                    tokio::time::sleep(delay).await;
                    Ok(())
                }
                Some(Reply::Hang) => future::pending().await,
                None => Err(FetchError::Network {
                    url,
                    reason: "connection refused".to_string(),
                }),
            }
        }
        .boxed()
    }

    fn fetch(&self, url: &str, _kind: AssetKind) -> BoxFuture<'static, Result<Bytes, FetchError>> {
        self.record(Event::Start(url.to_string()));
        let reply = self.reply_for(url);
        let this = self.clone();
        let url = url.to_string();
        async move {
            let result = match reply {
                Some(Reply::Ok(delay)) => {
                    tokio::time::sleep(delay).await;
                    Ok(Bytes::from(format!("/* {} */", url)))
                }
                Some(Reply::Fail(delay)) => {
                    tokio::time::sleep(delay).await;
                    Err(FetchError::Status {
                        url: url.clone(),
                        status: 500,
                    })
                }
                Some(Reply::Hang) => future::pending().await,
                None => Err(FetchError::Status {
                    url: url.clone(),
                    status: 404,
                }),
            };
            this.record(Event::Settle(url));
            result
        }
        .boxed()
    }
}
